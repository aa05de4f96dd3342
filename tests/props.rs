use civfive::cursor::Cursor;
use civfive::derived::localize_city_name;
use quickcheck_macros::quickcheck;
use rstest::rstest;

#[quickcheck]
fn var_string_roundtrips(text: String) -> bool {
    let mut buf = (text.len() as u32).to_le_bytes().to_vec();
    buf.extend_from_slice(text.as_bytes());
    let mut cursor = Cursor::new(&buf);
    cursor.read_var_string().map(|s| s == text).unwrap_or(false) && cursor.is_empty()
}

#[quickcheck]
fn fixed_width_reads_consume_exactly(values: Vec<u32>) -> bool {
    let mut buf = Vec::new();
    for v in &values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    let mut cursor = Cursor::new(&buf);
    for v in &values {
        match cursor.read_u32() {
            Ok(read) if read == *v => {}
            _ => return false,
        }
    }
    cursor.is_empty() && cursor.read_u8().is_err()
}

#[quickcheck]
fn failed_read_never_advances(data: Vec<u8>) -> bool {
    let mut cursor = Cursor::new(&data);
    while cursor.read_u32().is_ok() {}
    let stuck = cursor.position();
    let _ = cursor.read_u32();
    cursor.position() == stuck
}

#[rstest]
#[case("TXT_KEY_CITY_NAME_OSLO", "Oslo")]
#[case("TXT_KEY_CITY_NAME_NEW_YORK", "New York")]
#[case("TXT_KEY_CITYSTATE_CAPE_TOWN", "Cape Town")]
#[case("Brasilia", "Brasilia")]
fn localization_keys(#[case] key: &str, #[case] expected: &str) {
    assert_eq!(localize_city_name(key), expected);
}
