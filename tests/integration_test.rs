use sciio::{
    FioError, FormatTag, HandleId, Item, ItemKind, ItemMut, Mode, Precision, RVec, Registry,
    RegistryOptions, Value,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EXTENSIONS: [&str; 3] = ["gro", "trj", "trr"];

fn registry() -> Registry {
    Registry::with_options(RegistryOptions { backups: false, ..Default::default() })
}

fn scratch(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

fn sample_items() -> Vec<Value> {
    vec![
        Value::Real(1.5),
        Value::Int(-42),
        Value::UChar(vec![0, 7, 255]),
        Value::UShort(65535),
        Value::RVec([1.0, -2.5, 3.25]),
        Value::NRVec(vec![[0.5, 0.25, -0.125], [10.0, 20.0, 30.0]]),
        Value::IVec([1, -2, 3]),
        Value::String("SOL".into()),
    ]
}

fn write_all(reg: &mut Registry, path: &Path, values: &[Value]) {
    let h = reg.open(Some(path), Mode::Write).unwrap();
    reg.select(h).unwrap();
    for v in values {
        reg.write(v.as_item(), "sample").unwrap();
    }
    reg.close(h).unwrap();
}

fn open_read(reg: &mut Registry, path: &Path) -> HandleId {
    let h = reg.open(Some(path), Mode::Read).unwrap();
    reg.select(h).unwrap();
    h
}

#[test]
fn test_roundtrip_every_kind_every_family() {
    for ext in EXTENSIONS {
        let (_dir, path) = scratch(&format!("items.{ext}"));
        let mut reg = registry();
        let items = sample_items();
        write_all(&mut reg, &path, &items);

        let h = open_read(&mut reg, &path);
        for expected in &items {
            let got = reg.read_value(expected.kind(), expected.count(), "sample").unwrap();
            assert_eq!(&got, expected, "{ext}");
        }
        reg.close(h).unwrap();
    }
}

#[test]
fn test_read_into_destinations() {
    for ext in EXTENSIONS {
        let (_dir, path) = scratch(&format!("dest.{ext}"));
        let mut reg = registry();
        write_all(&mut reg, &path, &sample_items());

        let h = open_read(&mut reg, &path);
        let mut real = 0.0;
        let mut int = 0;
        let mut bytes = [0u8; 3];
        let mut ushort = 0u16;
        let mut rvec: RVec = [0.0; 3];
        let mut rvecs: [RVec; 2] = [[0.0; 3]; 2];
        let mut ivec = [0i32; 3];
        let mut name = String::new();

        reg.read(ItemMut::Real(&mut real), "real").unwrap();
        reg.read(ItemMut::Int(&mut int), "int").unwrap();
        reg.read(ItemMut::UChars(&mut bytes), "bytes").unwrap();
        reg.read(ItemMut::UShort(&mut ushort), "ushort").unwrap();
        reg.read(ItemMut::RVec(&mut rvec), "rvec").unwrap();
        reg.read(ItemMut::RVecs(&mut rvecs), "rvecs").unwrap();
        reg.read(ItemMut::IVec(&mut ivec), "ivec").unwrap();
        reg.read(ItemMut::Str(&mut name), "name").unwrap();
        reg.close(h).unwrap();

        assert_eq!(real, 1.5);
        assert_eq!(int, -42);
        assert_eq!(bytes, [0, 7, 255]);
        assert_eq!(ushort, 65535);
        assert_eq!(rvec, [1.0, -2.5, 3.25]);
        assert_eq!(rvecs[1], [10.0, 20.0, 30.0]);
        assert_eq!(ivec, [1, -2, 3]);
        assert_eq!(name, "SOL");
    }
}

#[test]
fn test_skip_advances_like_read() {
    for ext in EXTENSIONS {
        let (_dir, path) = scratch(&format!("skip.{ext}"));
        let mut reg = registry();
        let mut items = sample_items();
        items.push(Value::Int(99));
        write_all(&mut reg, &path, &items);

        let h = open_read(&mut reg, &path);
        for v in &items[..items.len() - 1] {
            reg.skip(v.kind(), v.count(), "skipped").unwrap();
        }
        assert_eq!(reg.read_value(ItemKind::Int, 1, "sentinel").unwrap(), Value::Int(99), "{ext}");
        let err = reg.skip(ItemKind::Int, 1, "past end").unwrap_err();
        assert!(err.is_eof(), "{ext}: {err}");
        reg.close(h).unwrap();
    }
}

#[test]
fn test_item_calls_need_a_selection() {
    let (dir, path) = scratch("a.gro");
    let mut reg = registry();

    let err = reg.write(Item::Int(1), "early").unwrap_err();
    assert!(matches!(err, FioError::NotSelected { .. }));
    assert!(err.is_misuse());

    let a = reg.open(Some(&path), Mode::Write).unwrap();
    let b = reg.open(Some(&dir.path().join("b.gro")), Mode::Write).unwrap();
    reg.select(a).unwrap();
    reg.write(Item::Int(1), "ok").unwrap();

    // Closing any handle clears the selection.
    reg.close(b).unwrap();
    assert_eq!(reg.selected(), None);
    let err = reg.write(Item::Int(2), "late").unwrap_err();
    assert!(matches!(err, FioError::NotSelected { .. }));

    reg.select(a).unwrap();
    reg.write(Item::Int(2), "again").unwrap();
    reg.close(a).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[test]
fn test_count_must_be_one_for_scalars() {
    let (_dir, path) = scratch("c.trj");
    let mut reg = registry();
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    reg.select(h).unwrap();
    let err = reg.skip(ItemKind::RVec, 2, "bad").unwrap_err();
    assert!(matches!(err, FioError::BadCount { kind: ItemKind::RVec, count: 2, .. }));
    assert!(err.is_misuse());
    assert_eq!(reg.tell(h).unwrap(), 0);
}

#[test]
fn test_portable_precision_sets_real_width() {
    for (precision, width) in [(Precision::Single, 4u64), (Precision::Double, 8)] {
        let (_dir, path) = scratch("p.trr");
        let mut reg = registry();
        let h = reg.open(Some(&path), Mode::Write).unwrap();
        reg.set_precision(h, precision).unwrap();
        reg.select(h).unwrap();
        reg.write(Item::Real(0.5), "x").unwrap();
        reg.write(Item::RVec([1.0, 2.0, 3.0]), "v").unwrap();
        reg.write(Item::Int(7), "i").unwrap();
        reg.close(h).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 4 * width + 4);

        let h = reg.open(Some(&path), Mode::Read).unwrap();
        reg.set_precision(h, precision).unwrap();
        reg.select(h).unwrap();
        assert_eq!(reg.read_value(ItemKind::Real, 1, "x").unwrap(), Value::Real(0.5));
        assert_eq!(reg.read_value(ItemKind::RVec, 1, "v").unwrap(), Value::RVec([1.0, 2.0, 3.0]));
        assert_eq!(reg.read_value(ItemKind::Int, 1, "i").unwrap(), Value::Int(7));
        reg.close(h).unwrap();
    }
}

#[test]
fn test_wire_layouts() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry();

    let native = dir.path().join("s.trj");
    write_all(&mut reg, &native, &[Value::String("ab".into())]);
    let mut expected = 3i32.to_ne_bytes().to_vec();
    expected.extend_from_slice(b"ab\0");
    assert_eq!(fs::read(&native).unwrap(), expected);

    let portable = dir.path().join("s.trr");
    write_all(&mut reg, &portable, &[Value::String("ab".into()), Value::UChar(vec![1, 2])]);
    assert_eq!(
        fs::read(&portable).unwrap(),
        [0, 0, 0, 3, 0, 0, 0, 2, b'a', b'b', 0, 0, 0, 0, 0, 1, 0, 0, 0, 2]
    );
}

#[test]
fn test_text_debug_comments() {
    let (_dir, path) = scratch("d.gro");
    let mut reg = Registry::with_options(RegistryOptions { debug: true, ..Default::default() });
    reg.set_comment("frame");
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    reg.select(h).unwrap();
    reg.write(Item::Int(3), "natoms").unwrap();
    reg.unset_comment();
    reg.write(Item::Str("SOL"), "resname").unwrap();
    reg.close(h).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], format!("{:>18}  ; frame natoms", 3));
    assert_eq!(lines[1], format!("{:<18}  ;  resname", "SOL"));

    // Comments are invisible to readers.
    let h = open_read(&mut reg, &path);
    assert_eq!(reg.read_value(ItemKind::Int, 1, "natoms").unwrap(), Value::Int(3));
    assert_eq!(reg.read_value(ItemKind::String, 1, "resname").unwrap(), Value::String("SOL".into()));
    reg.close(h).unwrap();
}

#[test]
fn test_debug_comment_stays_on_one_line() {
    let (_dir, path) = scratch("nl.gro");
    let mut reg = Registry::with_options(RegistryOptions { debug: true, ..Default::default() });
    reg.set_comment("step\n99");
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    reg.select(h).unwrap();
    reg.write(Item::Int(1), "first\n2 3").unwrap();
    reg.write(Item::Int(4), "second\r\n5").unwrap();
    reg.close(h).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2, "{text}");
    assert!(text.lines().next().unwrap().ends_with("; step 99 first 2 3"));

    let h = open_read(&mut reg, &path);
    assert_eq!(reg.read_value(ItemKind::Int, 1, "a").unwrap(), Value::Int(1));
    assert_eq!(reg.read_value(ItemKind::Int, 1, "b").unwrap(), Value::Int(4));
    assert!(reg.read_value(ItemKind::Int, 1, "c").unwrap_err().is_eof());
    reg.close(h).unwrap();
}

#[test]
fn test_text_tokens_span_lines() {
    let (_dir, path) = scratch("t.gro");
    fs::write(&path, "; header\n1 2 ;c\n\n3\n").unwrap();
    let mut reg = registry();
    let h = open_read(&mut reg, &path);
    assert_eq!(reg.read_value(ItemKind::IVec, 1, "v").unwrap(), Value::IVec([1, 2, 3]));
    reg.close(h).unwrap();
}

#[test]
fn test_text_parse_error_consumes_item() {
    let (_dir, path) = scratch("bad.gro");
    fs::write(&path, "1 x 3\n7\n").unwrap();
    let mut reg = registry();
    let h = open_read(&mut reg, &path);

    let err = reg.read_value(ItemKind::IVec, 1, "box").unwrap_err();
    assert!(!err.is_misuse());
    assert!(matches!(err.root(), FioError::Parse { kind: ItemKind::IVec, token } if token == "x"));
    let msg = err.to_string();
    assert!(msg.contains("IVEC") && msg.contains("box") && msg.contains("bad.gro"), "{msg}");

    assert_eq!(reg.read_value(ItemKind::Int, 1, "next").unwrap(), Value::Int(7));
    reg.close(h).unwrap();
}

#[test]
fn test_text_strings_must_be_one_token() {
    let (_dir, path) = scratch("s.gro");
    let mut reg = registry();
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    reg.select(h).unwrap();
    for bad in ["", "two words", "a;b"] {
        let err = reg.write(Item::Str(bad), "name").unwrap_err();
        assert!(matches!(err.root(), FioError::UnrepresentableString(_)), "{bad:?}");
    }
    reg.close(h).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn test_end_of_input_is_recoverable() {
    for ext in EXTENSIONS {
        let (_dir, path) = scratch(&format!("empty.{ext}"));
        fs::write(&path, b"").unwrap();
        let mut reg = registry();
        let h = open_read(&mut reg, &path);
        let err = reg.read_value(ItemKind::Int, 1, "natoms").unwrap_err();
        assert!(err.is_eof(), "{ext}: {err}");
        assert!(!err.is_misuse());
        assert!(reg.is_open(h));
        reg.close(h).unwrap();
    }
}

#[test]
fn test_missing_portable_input() {
    let (_dir, path) = scratch("missing.trr");
    let mut reg = registry();
    let err = reg.open(Some(&path), Mode::Read).unwrap_err();
    assert!(matches!(err, FioError::NotFound(p) if p == path));
    assert_eq!(reg.open_count(), 0);
}

#[test]
fn test_append_needs_existing_portable_file() {
    let (_dir, path) = scratch("more.trr");
    let mut reg = registry();
    let err = reg.open(Some(&path), Mode::Append).unwrap_err();
    assert!(matches!(err, FioError::NotFound(ref p) if *p == path), "{err}");
    assert!(!path.exists());

    write_all(&mut reg, &path, &[Value::Int(1)]);
    let h = reg.open(Some(&path), Mode::Append).unwrap();
    reg.select(h).unwrap();
    reg.write(Item::Int(2), "more").unwrap();
    reg.close(h).unwrap();
    assert_eq!(fs::read(&path).unwrap(), [0, 0, 0, 1, 0, 0, 0, 2]);
}

#[test]
fn test_oversized_string_header_is_eof() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry();

    let native = dir.path().join("huge.trj");
    fs::write(&native, i32::MAX.to_ne_bytes()).unwrap();
    let h = open_read(&mut reg, &native);
    let err = reg.read_value(ItemKind::String, 1, "title").unwrap_err();
    assert!(err.is_eof(), "{err}");
    reg.close(h).unwrap();

    let portable = dir.path().join("huge.trr");
    let mut bytes = i32::MAX.to_be_bytes().to_vec();
    bytes.extend_from_slice(&(i32::MAX as u32 - 1).to_be_bytes());
    bytes.extend_from_slice(b"abc");
    fs::write(&portable, bytes).unwrap();
    let h = open_read(&mut reg, &portable);
    let err = reg.read_value(ItemKind::String, 1, "title").unwrap_err();
    assert!(err.is_eof(), "{err}");
    reg.close(h).unwrap();
}

#[test]
fn test_backup_on_overwrite() {
    let (dir, path) = scratch("traj.trr");
    let mut reg = Registry::new();
    write_all(&mut reg, &path, &[Value::Int(1)]);
    write_all(&mut reg, &path, &[Value::Int(2)]);
    write_all(&mut reg, &path, &[Value::Int(3)]);

    assert_eq!(fs::read(&path).unwrap(), 3i32.to_be_bytes());
    assert_eq!(fs::read(dir.path().join("#traj.trr.1#")).unwrap(), 1i32.to_be_bytes());
    assert_eq!(fs::read(dir.path().join("#traj.trr.2#")).unwrap(), 2i32.to_be_bytes());
}

#[test]
fn test_unsupported_format() {
    let (_dir, path) = scratch("topol.top");
    let mut reg = registry();
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    assert_eq!(reg.format(h).unwrap(), FormatTag::Top);
    let err = reg.select(h).unwrap_err();
    assert!(matches!(err, FioError::UnsupportedFormat { tag: FormatTag::Top, .. }));
    assert!(err.is_misuse());

    // A format override makes the handle usable.
    reg.set_format(h, FormatTag::Gro).unwrap();
    reg.select(h).unwrap();
    reg.write(Item::Int(5), "n").unwrap();
    reg.close(h).unwrap();
}

#[test]
fn test_override_onto_other_channel() {
    let (_dir, path) = scratch("conf.gro");
    let mut reg = registry();
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    reg.set_format(h, FormatTag::Trr).unwrap();
    reg.select(h).unwrap();
    let err = reg.write(Item::Int(1), "n").unwrap_err();
    assert!(matches!(err, FioError::ChannelMismatch { .. }), "{err}");
    assert!(err.is_misuse());
    reg.close(h).unwrap();
}

#[test]
fn test_seek_is_stream_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = registry();

    let trj = dir.path().join("x.trj");
    write_all(&mut reg, &trj, &[Value::Int(1), Value::Int(2)]);
    let h = open_read(&mut reg, &trj);
    reg.seek(h, 4).unwrap();
    assert_eq!(reg.read_value(ItemKind::Int, 1, "second").unwrap(), Value::Int(2));
    assert_eq!(reg.tell(h).unwrap(), 8);
    reg.close(h).unwrap();

    let trr = dir.path().join("x.trr");
    write_all(&mut reg, &trr, &[Value::Int(1)]);
    let h = open_read(&mut reg, &trr);
    assert!(matches!(reg.seek(h, 0).unwrap_err(), FioError::NotSeekable { .. }));
    assert!(matches!(reg.tell(h).unwrap_err(), FioError::NotSeekable { .. }));
    reg.close(h).unwrap();
}

#[test]
fn test_rewind() {
    for ext in EXTENSIONS {
        let (_dir, path) = scratch(&format!("r.{ext}"));
        let mut reg = registry();
        write_all(&mut reg, &path, &[Value::Int(11), Value::Int(22)]);

        let h = open_read(&mut reg, &path);
        assert_eq!(reg.read_value(ItemKind::Int, 1, "a").unwrap(), Value::Int(11));
        reg.rewind(h).unwrap();
        assert_eq!(reg.read_value(ItemKind::Int, 1, "a").unwrap(), Value::Int(11));
        assert_eq!(reg.read_value(ItemKind::Int, 1, "b").unwrap(), Value::Int(22));
        reg.close(h).unwrap();
    }
}

#[test]
fn test_flush_makes_output_visible() {
    let (_dir, path) = scratch("f.trr");
    let mut reg = registry();
    let h = reg.open(Some(&path), Mode::Write).unwrap();
    reg.select(h).unwrap();
    reg.write(Item::Int(5), "n").unwrap();
    reg.flush(h).unwrap();
    assert_eq!(fs::read(&path).unwrap(), 5i32.to_be_bytes());
    reg.close(h).unwrap();
}

#[test]
fn test_handles_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let gro = dir.path().join("a.gro");
    let trr = dir.path().join("b.trr");
    let mut reg = registry();

    let a = reg.open(Some(&gro), Mode::Write).unwrap();
    let b = reg.open(Some(&trr), Mode::Write).unwrap();
    for i in 0..3 {
        reg.select(a).unwrap();
        reg.write(Item::Int(i), "a").unwrap();
        reg.select(b).unwrap();
        reg.write(Item::Int(-i), "b").unwrap();
    }
    reg.close(a).unwrap();
    reg.close(b).unwrap();

    let a = open_read(&mut reg, &gro);
    for i in 0..3 {
        assert_eq!(reg.read_value(ItemKind::Int, 1, "a").unwrap(), Value::Int(i));
    }
    reg.close(a).unwrap();
    assert_eq!(fs::metadata(&trr).unwrap().len(), 12);
}
