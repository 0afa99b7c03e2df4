//! End-to-end check that the compiled binary accepts a real source file and
//! emits assembly containing the expected call/label sequence, without
//! assembling or linking it (no toolchain dependency here).

use std::process::Command;

#[test]
fn compiles_factorial_sample_to_assembly() {
  let bin = env!("CARGO_BIN_EXE_staticpyc");
  let sample = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/factorial.py");

  let output = Command::new(bin)
    .arg(sample)
    .arg("-O")
    .arg("2")
    .output()
    .expect("failed to run staticpyc");

  assert!(
    output.status.success(),
    "staticpyc exited with {:?}, stderr: {}",
    output.status.code(),
    String::from_utf8_lossy(&output.stderr)
  );

  let asm = String::from_utf8(output.stdout).expect("assembly output is not UTF-8");
  assert!(asm.contains("factorial:"));
  assert!(asm.contains("call factorial"));
  assert!(asm.contains(".global main"));
}

#[test]
fn missing_input_file_exits_with_io_code() {
  let bin = env!("CARGO_BIN_EXE_staticpyc");

  let output = Command::new(bin)
    .arg("/nonexistent/path/does-not-exist.py")
    .output()
    .expect("failed to run staticpyc");

  assert_eq!(output.status.code(), Some(2));
}

#[test]
fn use_before_assignment_exits_with_diagnostic_code() {
  let bin = env!("CARGO_BIN_EXE_staticpyc");

  let mut tmp = std::env::temp_dir();
  tmp.push("staticpyc_use_before_assignment_test.py");
  std::fs::write(&tmp, "def f():\n    return y\n").unwrap();

  let output = Command::new(bin).arg(&tmp).output().expect("failed to run staticpyc");

  let _ = std::fs::remove_file(&tmp);

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("used before assignment"));
}
