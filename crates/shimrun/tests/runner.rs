use std::path::PathBuf;
use std::process::Command;

use wasmtime::Val;

use shimcall::ContextBuilder;
use shimcall::Fallback;
use shimcall::SharedBuffer;
use shimrun::Error;
use shimrun::Runner;

// --- Helpers ---

const HELLO: &str = r#"(module
    (import "wasi_snapshot_preview1" "fd_write" (func $fd_write (param i32 i32 i32 i32) (result i32)))
    (memory (export "memory") 1)
    (data (i32.const 8) "\20\00\00\00\06\00\00\00")
    (data (i32.const 32) "hello\n")
    (func (export "_start")
        (drop (call $fd_write (i32.const 1) (i32.const 8) (i32.const 1) (i32.const 4)))))"#;

const EXIT: &str = r#"(module
    (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
    (memory (export "memory") 1)
    (func $inner (call $exit (i32.const 7)))
    (func (export "_start") (call $inner)))"#;

fn write_module(name: &str, wat: &str) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("shimrun-{}-{}.wat", std::process::id(), name));
    std::fs::write(&path, wat)?;
    Ok(path)
}

// --- Test 1: successful run ---

#[test]
fn test_run_hello() -> anyhow::Result<()> {
    let runner = Runner::new()?;
    let module = runner.compile(HELLO.as_bytes())?;
    let stdout = SharedBuffer::new();
    let mut session = runner.instantiate(&module, ContextBuilder::new().stdout(stdout.clone()).build())?;

    let results = session.invoke("_start")?;
    assert!(results.is_empty());
    assert_eq!(stdout.to_string_lossy(), "hello\n");
    assert_eq!(session.ctx().diagnostics().total_calls(), 1);
    Ok(())
}

// --- Test 2: proc_exit becomes a trap report ---

#[test]
fn test_proc_exit_report() -> anyhow::Result<()> {
    let runner = Runner::new()?;
    let module = runner.compile(EXIT.as_bytes())?;
    let mut session = runner.instantiate(&module, ContextBuilder::new().build())?;

    let Err(err) = session.invoke("_start") else {
        panic!("proc_exit should trap");
    };
    assert_eq!(err.exit_code(), Some(7));
    let Error::Trap(report) = &err else {
        panic!("expected a trap, got {}", err);
    };
    assert_eq!(report.message, "proc_exit(7)");
    assert!(report.frames.len() >= 2, "frames: {:?}", report.frames);
    assert_eq!(report.origin.as_ref(), report.frames.first());
    assert!(err.to_string().contains("wasm backtrace:"));
    Ok(())
}

// --- Test 3: ordinary wasm traps ---

#[test]
fn test_unreachable_report() -> anyhow::Result<()> {
    let runner = Runner::new()?;
    let module = runner.compile(br#"(module (func (export "_start") unreachable))"#)?;
    let mut session = runner.instantiate(&module, ContextBuilder::new().build())?;

    let Err(Error::Trap(report)) = session.invoke("_start") else {
        panic!("unreachable should trap");
    };
    assert_eq!(report.exit, None);
    assert!(report.message.contains("unreachable"), "{}", report.message);
    assert_eq!(report.frames.len(), 1);
    Ok(())
}

// --- Test 4: entry point problems ---

#[test]
fn test_missing_and_malformed_entry() -> anyhow::Result<()> {
    let runner = Runner::new()?;
    let module = runner.compile(
        br#"(module
            (func (export "needs_arg") (param i32))
            (func (export "answer") (result i32) (i32.const 42)))"#,
    )?;
    let mut session = runner.instantiate(&module, ContextBuilder::new().build())?;

    assert!(matches!(session.invoke("_start"), Err(Error::MissingExport(name)) if name == "_start"));
    assert!(matches!(session.invoke("needs_arg"), Err(Error::EntrySignature { .. })));

    let results = session.invoke("answer")?;
    assert!(matches!(results.as_slice(), [Val::I32(42)]));
    Ok(())
}

// --- Test 5: unresolved imports ---

#[test]
fn test_unresolved_import_policy() -> anyhow::Result<()> {
    let wat = br#"(module
        (import "env" "host_only" (func))
        (func (export "_start")))"#;

    let runner = Runner::new()?;
    let module = runner.compile(wat)?;
    assert!(matches!(
        runner.instantiate(&module, ContextBuilder::new().build()),
        Err(Error::Resolve(_))
    ));

    let runner = Runner::new()?.fallback(Fallback::TrapOnCall);
    let module = runner.compile(wat)?;
    let mut session = runner.instantiate(&module, ContextBuilder::new().build())?;
    session.invoke("_start")?;
    Ok(())
}

// --- Test 6: loading ---

#[test]
fn test_load_errors() -> anyhow::Result<()> {
    let runner = Runner::new()?;
    let missing = std::env::temp_dir().join("shimrun-does-not-exist.wasm");
    assert!(matches!(runner.load(&missing), Err(Error::Read { .. })));
    assert!(matches!(runner.compile(b"not a module"), Err(Error::Compile(_))));
    Ok(())
}

// --- Test 7: command line ---

#[test]
fn test_cli_exit_status() -> anyhow::Result<()> {
    let hello = write_module("hello", HELLO)?;
    let exit = write_module("exit", EXIT)?;
    let binary = env!("CARGO_BIN_EXE_shimrun");

    let output = Command::new(binary).arg(&hello).arg("extra").output()?;
    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello\n");

    let output = Command::new(binary).arg(&exit).output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("proc_exit(7)"));

    let output = Command::new(binary).arg("--list").arg(&exit).output()?;
    assert!(output.status.success());
    let listing = String::from_utf8_lossy(&output.stdout);
    assert!(listing.contains("func wasi_snapshot_preview1::proc_exit(i32) -> () [ok]"), "{}", listing);
    assert!(listing.contains("func _start"), "{}", listing);

    let output = Command::new(binary).args(["--env", "NOEQUALS"]).arg(&hello).output()?;
    assert!(!output.status.success());

    std::fs::remove_file(hello)?;
    std::fs::remove_file(exit)?;
    Ok(())
}
