use fixity_core::codec::{self, PathIndex};
use fixity_core::manifest;
use fixity_core::storage::MemFs;
use proptest::prelude::*;
use std::path::Path;

const H1: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
const H2: &str = "486ea46224d1bb4fb680f34f7c9ad96a8f24ec88be73ea8e5a6c65260e9cb8a7";

#[test]
fn blank_line_is_skipped() {
    let (by_path, by_hash) = codec::parse(&format!("/data/a.txt: {H1}\n"));
    assert_eq!(by_path.len(), 1);
    assert_eq!(by_path["/data/a.txt"], H1);
    assert_eq!(by_hash[H1], "/data/a.txt");
}

#[test]
fn malformed_lines_are_tolerated() {
    let content = [
        format!("/data/a.txt: {H1}"),
        "no delimiter here".to_string(),
        "/odd: name: x".to_string(),
        String::new(),
        format!("/data/b.txt: {H2}"),
    ]
    .join("\n");
    let (by_path, _) = codec::parse(&content);
    assert_eq!(by_path.keys().collect::<Vec<_>>(), vec!["/data/a.txt", "/data/b.txt"]);
}

#[test]
fn empty_hash_is_kept() {
    let (by_path, by_hash) = codec::parse("/gone: ");
    assert_eq!(by_path["/gone"], "");
    assert_eq!(by_hash[""], "/gone");
}

#[test]
fn duplicate_path_last_wins() {
    let (by_path, by_hash) = codec::parse(&format!("/a: {H1}\n/a: {H2}"));
    assert_eq!(by_path.len(), 1);
    assert_eq!(by_path["/a"], H2);
    // Both hashes stay reachable in the reverse index
    assert_eq!(by_hash.len(), 2);
}

#[test]
fn duplicate_content_reverse_lookup_last_wins() {
    let (by_path, by_hash) = codec::parse(&format!("/a: {H1}\n/b: {H1}"));
    assert_eq!(by_path.len(), 2);
    assert_eq!(by_hash.len(), 1);
    assert_eq!(by_hash[H1], "/b");
}

#[test]
fn crlf_is_not_stripped() {
    let (by_path, _) = codec::parse(&format!("/a: {H1}\r\n"));
    assert_eq!(by_path["/a"], format!("{H1}\r"));
}

#[test]
fn render_has_no_trailing_newline() {
    assert_eq!(codec::render(&["/a: x", "/b: y"]), "/a: x\n/b: y");
    assert_eq!(codec::render::<&str>(&[]), "");
    assert_eq!(codec::format_entry("/a", H1), format!("/a: {H1}"));
}

fn path_strategy() -> impl Strategy<Value = String> {
    "(/[a-zA-Z0-9_.-]{1,12}){1,4}"
}

proptest! {
    #[test]
    fn create_then_load_roundtrips(
        records in prop::collection::btree_map(path_strategy(), "[0-9a-f]{64}", 0..16)
    ) {
        let mem = MemFs::new();
        let entries: Vec<String> =
            records.iter().map(|(p, h)| codec::format_entry(p, h)).collect();
        let at = Path::new("/manifest");
        manifest::create_in(&mem, at, &entries).unwrap();
        let (by_path, by_hash) = manifest::load_in(&mem, at).unwrap();
        let expected: PathIndex = records.clone();
        prop_assert_eq!(&by_path, &expected);
        for (p, h) in &records {
            prop_assert!(by_hash.contains_key(h));
            prop_assert!(records.get(&by_hash[h]).map(|x| x == h).unwrap_or(false), "{}", p);
        }
    }
}
