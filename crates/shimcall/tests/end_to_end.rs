use wasmtime::Engine;
use wasmtime::Instance;
use wasmtime::Module;
use wasmtime::Store;

use shimcall::build_import_vector;
use shimcall::clock::clock_time;
use shimcall::ContextBuilder;
use shimcall::Errno;
use shimcall::Fallback;
use shimcall::Registry;
use shimcall::SharedBuffer;
use shimcall::ShimCtx;
use shimcall::ShimTrap;
use shimcall::UnsupportedPolicy;

// --- Helpers ---

fn instantiate(wat: &str, ctx: ShimCtx, fallback: Fallback) -> anyhow::Result<(Store<ShimCtx>, Instance)> {
    let engine = Engine::default();
    let module = Module::new(&engine, wat)?;
    let mut store = Store::new(&engine, ctx);
    let externs = build_import_vector(&mut store, &module, &Registry::preview1()).into_externs(&mut store, fallback)?;
    let instance = Instance::new(&mut store, &module, &externs)?;
    Ok((store, instance))
}

fn memory_bytes(store: &mut Store<ShimCtx>, instance: &Instance, at: usize, len: usize) -> Vec<u8> {
    let memory = instance.get_memory(&mut *store, "memory").expect("guest exports memory");
    memory.data(&*store)[at..at + len].to_vec()
}

const CLOCK_AND_EXIT: &str = r#"(module
    (import "wasi_snapshot_preview1" "clock_time_get" (func $clock (param i32 i64 i32) (result i32)))
    (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
    (memory (export "memory") 1)
    (func (export "now") (param $ptr i32) (result i32)
        (call $clock (i32.const 0) (i64.const 1) (local.get $ptr)))
    (func (export "exit") (param i32)
        (call $exit (local.get 0))))"#;

// --- Test 1: clock_time_get in bounds ---

#[test]
fn test_clock_time_get_writes_timestamp() -> anyhow::Result<()> {
    let (mut store, instance) = instantiate(CLOCK_AND_EXIT, ContextBuilder::new().build(), Fallback::Reject)?;
    let now = instance.get_typed_func::<i32, i32>(&mut store, "now")?;

    let before = clock_time(shimabi::Clockid::Realtime).unwrap();
    let errno = now.call(&mut store, 16)?;
    let after = clock_time(shimabi::Clockid::Realtime).unwrap();

    assert_eq!(errno, Errno::Success.as_i32());
    let raw = memory_bytes(&mut store, &instance, 16, 8);
    let stamp = u64::from_le_bytes(raw.try_into().unwrap());
    assert!(before <= stamp && stamp <= after, "{} <= {} <= {}", before, stamp, after);
    Ok(())
}

// --- Test 2: clock_time_get past the end of memory ---

#[test]
fn test_clock_time_get_out_of_bounds() -> anyhow::Result<()> {
    let (mut store, instance) = instantiate(CLOCK_AND_EXIT, ContextBuilder::new().build(), Fallback::Reject)?;
    let now = instance.get_typed_func::<i32, i32>(&mut store, "now")?;

    let mem_size = 65536;
    assert_eq!(now.call(&mut store, mem_size - 7)?, Errno::TooBig.as_i32());
    assert_eq!(now.call(&mut store, -8)?, Errno::TooBig.as_i32());
    let tail = memory_bytes(&mut store, &instance, 65536 - 16, 16);
    assert!(tail.iter().all(|b| *b == 0));

    assert_eq!(now.call(&mut store, mem_size - 8)?, Errno::Success.as_i32());
    Ok(())
}

// --- Test 3: proc_exit ---

#[test]
fn test_proc_exit_traps_with_code() -> anyhow::Result<()> {
    let (mut store, instance) = instantiate(CLOCK_AND_EXIT, ContextBuilder::new().build(), Fallback::Reject)?;
    let exit = instance.get_typed_func::<i32, ()>(&mut store, "exit")?;

    let err = exit.call(&mut store, 3).unwrap_err();
    assert_eq!(err.downcast_ref::<ShimTrap>(), Some(&ShimTrap::ProcExit(3)));
    Ok(())
}

// --- Test 4: fd_write to captured stdout ---

#[test]
fn test_hello_world() -> anyhow::Result<()> {
    let wat = r#"(module
        (import "wasi_snapshot_preview1" "fd_write" (func $fd_write (param i32 i32 i32 i32) (result i32)))
        (memory (export "memory") 1)
        (data (i32.const 8) "\20\00\00\00\0c\00\00\00")
        (data (i32.const 32) "hello world\n")
        (func (export "_start") (result i32)
            (call $fd_write (i32.const 1) (i32.const 8) (i32.const 1) (i32.const 4))))"#;

    let stdout = SharedBuffer::new();
    let ctx = ContextBuilder::new().stdout(stdout.clone()).build();
    let (mut store, instance) = instantiate(wat, ctx, Fallback::Reject)?;
    let start = instance.get_typed_func::<(), i32>(&mut store, "_start")?;

    assert_eq!(start.call(&mut store, ())?, 0);
    assert_eq!(stdout.to_string_lossy(), "hello world\n");
    assert_eq!(memory_bytes(&mut store, &instance, 4, 4), 12u32.to_le_bytes());
    assert_eq!(store.data().diagnostics().total_calls(), 1);
    Ok(())
}

// --- Test 5: argv seen by the guest ---

#[test]
fn test_args_round_trip_through_guest() -> anyhow::Result<()> {
    let wat = r#"(module
        (import "wasi_snapshot_preview1" "args_sizes_get" (func $sizes (param i32 i32) (result i32)))
        (import "wasi_snapshot_preview1" "args_get" (func $get (param i32 i32) (result i32)))
        (memory (export "memory") 1)
        (func (export "_start") (result i32)
            (drop (call $sizes (i32.const 0) (i32.const 4)))
            (call $get (i32.const 16) (i32.const 64))))"#;

    let ctx = ContextBuilder::new().args(["main.wasm", "--flag"]).build();
    let (mut store, instance) = instantiate(wat, ctx, Fallback::Reject)?;
    let start = instance.get_typed_func::<(), i32>(&mut store, "_start")?;
    assert_eq!(start.call(&mut store, ())?, 0);

    let header = memory_bytes(&mut store, &instance, 0, 8);
    assert_eq!(header, [2, 0, 0, 0, 17, 0, 0, 0]);
    let pointers = memory_bytes(&mut store, &instance, 16, 8);
    assert_eq!(pointers, [64, 0, 0, 0, 74, 0, 0, 0]);
    assert_eq!(memory_bytes(&mut store, &instance, 64, 17), b"main.wasm\0--flag\0");
    Ok(())
}

// --- Test 6: unsupported functions under each policy ---

const UNLINK: &str = r#"(module
    (import "wasi_snapshot_preview1" "path_unlink_file" (func $unlink (param i32 i32 i32) (result i32)))
    (memory (export "memory") 1)
    (func (export "_start") (result i32)
        (call $unlink (i32.const 3) (i32.const 0) (i32.const 4))))"#;

#[test]
fn test_unsupported_defaults_to_nosys() -> anyhow::Result<()> {
    let (mut store, instance) = instantiate(UNLINK, ContextBuilder::new().build(), Fallback::Reject)?;
    let start = instance.get_typed_func::<(), i32>(&mut store, "_start")?;
    assert_eq!(start.call(&mut store, ())?, Errno::Nosys.as_i32());
    assert_eq!(start.call(&mut store, ())?, Errno::Nosys.as_i32());
    assert_eq!(store.data().diagnostics().unsupported_calls("path_unlink_file"), 2);
    Ok(())
}

#[test]
fn test_unsupported_pretend_success() -> anyhow::Result<()> {
    let ctx = ContextBuilder::new().unsupported_policy(UnsupportedPolicy::PretendSuccess).build();
    let (mut store, instance) = instantiate(UNLINK, ctx, Fallback::Reject)?;
    let start = instance.get_typed_func::<(), i32>(&mut store, "_start")?;
    assert_eq!(start.call(&mut store, ())?, 0);
    Ok(())
}

#[test]
fn test_unsupported_trap() -> anyhow::Result<()> {
    let ctx = ContextBuilder::new().unsupported_policy(UnsupportedPolicy::Trap).build();
    let (mut store, instance) = instantiate(UNLINK, ctx, Fallback::Reject)?;
    let start = instance.get_typed_func::<(), i32>(&mut store, "_start")?;
    let err = start.call(&mut store, ()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ShimTrap>(),
        Some(&ShimTrap::NotImplemented("path_unlink_file"))
    );
    Ok(())
}

// --- Test 7: guest without memory ---

#[test]
fn test_guest_without_memory_gets_2big() -> anyhow::Result<()> {
    let wat = r#"(module
        (import "wasi_snapshot_preview1" "clock_time_get" (func $clock (param i32 i64 i32) (result i32)))
        (func (export "now") (result i32)
            (call $clock (i32.const 1) (i64.const 0) (i32.const 0))))"#;
    let (mut store, instance) = instantiate(wat, ContextBuilder::new().build(), Fallback::Reject)?;
    let now = instance.get_typed_func::<(), i32>(&mut store, "now")?;
    assert_eq!(now.call(&mut store, ())?, Errno::TooBig.as_i32());
    Ok(())
}

// --- Test 8: unresolved imports ---

const FOREIGN: &str = r#"(module
    (import "env" "missing" (func $missing (param i32) (result i32)))
    (import "wasi_snapshot_preview1" "sched_yield" (func $yield (result i32)))
    (func (export "yield") (result i32) (call $yield))
    (func (export "missing") (result i32) (call $missing (i32.const 1))))"#;

#[test]
fn test_unresolved_rejected_by_default() {
    let Err(err) = instantiate(FOREIGN, ContextBuilder::new().build(), Fallback::Reject) else {
        panic!("instantiation should fail");
    };
    let err = err.downcast::<shimcall::ResolveError>().unwrap();
    assert_eq!(
        err,
        shimcall::ResolveError::Unresolved(vec!["func env::missing(i32) -> (i32)".to_string()])
    );
}

#[test]
fn test_unresolved_trap_on_call() -> anyhow::Result<()> {
    let (mut store, instance) = instantiate(FOREIGN, ContextBuilder::new().build(), Fallback::TrapOnCall)?;

    let yield_now = instance.get_typed_func::<(), i32>(&mut store, "yield")?;
    assert_eq!(yield_now.call(&mut store, ())?, 0);

    let missing = instance.get_typed_func::<(), i32>(&mut store, "missing")?;
    let err = missing.call(&mut store, ()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ShimTrap>(),
        Some(&ShimTrap::UnresolvedImport("env::missing".to_string()))
    );
    Ok(())
}

// --- Test 9: instances are independent ---

#[test]
fn test_diagnostics_are_per_instance() -> anyhow::Result<()> {
    let (mut first, first_instance) = instantiate(UNLINK, ContextBuilder::new().build(), Fallback::Reject)?;
    let (second, _) = instantiate(UNLINK, ContextBuilder::new().build(), Fallback::Reject)?;

    let start = first_instance.get_typed_func::<(), i32>(&mut first, "_start")?;
    start.call(&mut first, ())?;

    assert_eq!(first.data().diagnostics().unsupported_calls("path_unlink_file"), 1);
    assert_eq!(second.data().diagnostics().unsupported_calls("path_unlink_file"), 0);
    Ok(())
}
