use civfive::{replay::EventKind, ErrorKind, ReplayFile};

fn push_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn replay_fixture() -> Vec<u8> {
    let mut buf = Vec::new();

    // preamble
    buf.extend_from_slice(b"CIV5");
    push_u32(&mut buf, 0);
    push_str(&mut buf, "1.0.3.279");
    push_str(&mut buf, "403694");
    push_u32(&mut buf, 330);
    buf.push(0);

    push_str(&mut buf, "CIVILIZATION_SWEDEN");

    // game config
    push_str(&mut buf, "HANDICAP_KING");
    push_str(&mut buf, "ERA_ANCIENT");
    push_str(&mut buf, "ERA_MODERN");
    push_str(&mut buf, "GAMESPEED_STANDARD");
    push_str(&mut buf, "WORLDSIZE_SMALL");
    push_str(&mut buf, "Assets\\Maps\\Continents.lua");

    // empty dlc and mod lists
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);

    // player config
    push_str(&mut buf, "CIVILIZATION_SWEDEN");
    push_str(&mut buf, "LEADER_GUSTAVUS_ADOLPHUS");
    push_str(&mut buf, "PLAYERCOLOR_SWEDEN");
    buf.extend_from_slice(&[0u8; 8]);
    push_str(&mut buf, "Assets\\Maps\\Continents.lua");

    // unidentified block, discriminator 2: seven values, empty inner array
    // plus one extra value, one pad byte
    push_u32(&mut buf, 2);
    buf.extend_from_slice(&[0u8; 7 * 4]);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);
    buf.push(0);

    // turn range
    push_u32(&mut buf, 0);
    push_i32(&mut buf, -4000);
    push_u32(&mut buf, 330);
    push_str(&mut buf, "1982 AD");
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);

    // one civilization
    push_u32(&mut buf, 1);
    for v in [3, 1, 0, 7].iter() {
        push_i32(&mut buf, *v);
    }
    push_str(&mut buf, "LEADER_GUSTAVUS_ADOLPHUS");
    push_str(&mut buf, "Kingdom of Sweden");
    push_str(&mut buf, "Sweden");
    push_str(&mut buf, "Swedish");

    // dataset names
    push_u32(&mut buf, 2);
    push_str(&mut buf, "REPLAYDATASET_SCORE");
    push_str(&mut buf, "REPLAYDATASET_GOLD");

    // datasets: one civ, two rows, first row has one point
    push_u32(&mut buf, 1);
    push_u32(&mut buf, 2);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, 10);
    push_i32(&mut buf, 55);
    push_u32(&mut buf, 0);

    // pre-event value
    push_u32(&mut buf, 0);

    // two events
    push_u32(&mut buf, 2);
    push_u32(&mut buf, 1); // turn
    push_u32(&mut buf, 1); // city founded
    push_u32(&mut buf, 1);
    buf.extend_from_slice(&30u16.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    push_u32(&mut buf, 0);
    push_str(&mut buf, "Stockholm is founded.");
    push_u32(&mut buf, 2); // turn
    push_u32(&mut buf, 2); // tiles claimed
    push_u32(&mut buf, 2);
    buf.extend_from_slice(&31u16.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&29u16.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    push_u32(&mut buf, 0);
    push_str(&mut buf, "");

    // map dimensions and an empty tile-property array
    push_u32(&mut buf, 80);
    push_u32(&mut buf, 52);
    push_u32(&mut buf, 0);

    buf
}

#[test]
fn decodes_full_replay() {
    let data = replay_fixture();
    let replay = ReplayFile::from_slice(&data).unwrap();

    assert_eq!(replay.player_civ, "CIVILIZATION_SWEDEN");
    assert_eq!(replay.game_version, "1.0.3.279");
    assert_eq!(replay.game_build, "403694");
    assert_eq!(replay.current_turn, 330);
    assert_eq!(replay.map_width, 80);
    assert_eq!(replay.map_height, 52);

    assert_eq!(replay.civs.len(), 1);
    assert_eq!(replay.civs[0].name, "Sweden");
    assert_eq!(replay.civs[0].unknown, [3, 1, 0, 7]);
}

#[test]
fn datasets_keyed_by_name() {
    let data = replay_fixture();
    let replay = ReplayFile::from_slice(&data).unwrap();

    assert_eq!(replay.dataset_names.len(), 2);
    let dataset = &replay.datasets[0];
    let score = &dataset.values["REPLAYDATASET_SCORE"];
    assert_eq!(score.len(), 1);
    assert_eq!(score[0].turn, 10);
    assert_eq!(score[0].value, 55);
    assert!(dataset.values["REPLAYDATASET_GOLD"].is_empty());
}

#[test]
fn events_decoded_and_grouped_by_turn() {
    let data = replay_fixture();
    let replay = ReplayFile::from_slice(&data).unwrap();

    assert_eq!(replay.events.len(), 2);
    assert_eq!(replay.events[0].kind(), EventKind::CityFounded);
    assert_eq!(replay.events[0].text, "Stockholm is founded.");
    assert_eq!(replay.events[1].kind(), EventKind::TilesClaimed);
    assert_eq!(replay.events[1].tiles.len(), 2);

    let by_turn = replay.events_by_turn();
    assert_eq!(by_turn.len(), 2);
    assert_eq!(by_turn[&1].len(), 1);
    assert_eq!(by_turn[&2][0].tiles[0].x, 31);
}

#[test]
fn truncated_event_stream_is_an_error() {
    let data = replay_fixture();
    // cut inside the second event's text
    let err = ReplayFile::from_slice(&data[..data.len() - 16]).unwrap_err();
    match err.kind() {
        ErrorKind::Eof { .. } => {}
        other => panic!("unexpected error: {:?}", other),
    }
}

#[cfg(feature = "json")]
#[test]
fn replay_round_trips_through_json() {
    use civfive::json;

    let data = replay_fixture();
    let replay = ReplayFile::from_slice(&data).unwrap();
    let exported = json::export_replay(&replay).unwrap();
    let imported = json::import_replay(exported.as_bytes()).unwrap();
    assert_eq!(imported, replay);
}
