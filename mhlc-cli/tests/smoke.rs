use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn mhl(hashes: &[(&str, &str, u64)]) -> String {
    let mut s = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<hashlist version=\"1.1\">\n");
    for (file, xx, size) in hashes {
        s.push_str(&format!(
            "  <hash>\n    <file>{file}</file>\n    <size>{size}</size>\n    <xxhash64be>{xx}</xxhash64be>\n  </hash>\n"
        ));
    }
    s.push_str("</hashlist>\n");
    s
}

#[test]
fn compare_reports_observations() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("day1.mhl");
    let b = td.child("day1_copy.mhl");
    a.write_str(&mhl(&[("Clip/A001.mov", "1111111111111111", 2048), ("Clip/A002.mov", "2222222222222222", 10)])).unwrap();
    b.write_str(&mhl(&[("Clip/A001.mov", "1111111111111111", 2048), ("Clip/A003.mov", "3333333333333333", 10)])).unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args(["--no-color", a.path().to_str().unwrap(), b.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("mhlc (v"))
        .stdout(predicate::str::contains("1 file matched perfectly"))
        .stdout(predicate::str::contains("2 files were present only in one MHL or the other"))
        .stdout(predicate::str::contains("Run the check again with --info"));
}

#[test]
fn info_flag_prints_details() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("a.mhl");
    let b = td.child("b.mhl");
    a.write_str(&mhl(&[("Clip/A001.mov", "1111111111111111", 2048)])).unwrap();
    b.write_str(&mhl(&[("Clip/A001_renamed.mov", "1111111111111111", 2048)])).unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args(["--no-color", "--info", a.path().to_str().unwrap(), b.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Filename: different (1st): A001.mov"))
        .stdout(predicate::str::contains("1 file matched, but with differences"))
        .stdout(predicate::str::contains("--info").not());
}

#[test]
fn missing_inputs_are_listed() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("a.mhl");
    a.write_str(&mhl(&[("A001.mov", "1111111111111111", 1)])).unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args([a.path().to_str().unwrap(), "no/such/file.mhl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find"))
        .stderr(predicate::str::contains("no/such/file.mhl"));
}

#[test]
fn empty_manifest_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("a.mhl");
    let b = td.child("b.mhl");
    a.write_str("<hashlist version=\"1.1\"></hashlist>").unwrap();
    b.write_str(&mhl(&[("A001.mov", "1111111111111111", 1)])).unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args([a.path().to_str().unwrap(), b.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files were listed"));
}

#[test]
fn single_path_lists_manifest() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("card.md5");
    a.write_str("d41d8cd98f00b204e9800998ecf8427e  Clip/A001.mov\n").unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args(["--no-color", a.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1st MHL file:"))
        .stdout(predicate::str::contains("A001.mov  size unspecified  d41d8cd98f00b204e9800998ecf8427e (md5)"));
}

#[test]
fn json_output_parses() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("a.mhl");
    let b = td.child("b.mhl");
    a.write_str(&mhl(&[("A001.mov", "1111111111111111", 1)])).unwrap();
    b.write_str(&mhl(&[("A001.mov", "1111111111111111", 2)])).unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args(["--json", a.path().to_str().unwrap(), b.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"IMPOSSIBLE\": 1"))
        .stdout(predicate::str::contains("mhlc (v").not());
}

#[test]
fn binary_sizes_and_three_paths() {
    let td = assert_fs::TempDir::new().unwrap();
    let a = td.child("a.mhl");
    a.write_str(&mhl(&[("A001.mov", "1111111111111111", 1_048_576)])).unwrap();
    let p = a.path().to_str().unwrap();

    Command::cargo_bin("mhlc").unwrap()
        .args(["--no-color", "--size-format", "binary", p, p])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0 MiB (1048576 bytes)"));

    Command::cargo_bin("mhlc").unwrap().args([p, p, p]).assert().failure();
}
