//! Human-readable renderings of values, signatures, imports, exports and
//! trap frames. Used by logs and by the runner's `--list` output.

use wasmtime::ExportType;
use wasmtime::ExternType;
use wasmtime::FrameInfo;
use wasmtime::FuncType;
use wasmtime::Module;
use wasmtime::Val;

use crate::resolve::describe_imports;
use crate::resolve::ImportDescriptor;
use crate::resolve::ImportKind;
use crate::value::ValKind;

/// `0x2a:i32`, `1.5:f32`, `null:funcref`.
pub fn format_val(val: &Val) -> String {
    match val {
        Val::I32(v) => format!("{:#x}:i32", v),
        Val::I64(v) => format!("{:#x}:i64", v),
        Val::F32(bits) => format!("{}:f32", f32::from_bits(*bits)),
        Val::F64(bits) => format!("{}:f64", f64::from_bits(*bits)),
        Val::FuncRef(None) => "null:funcref".to_string(),
        Val::FuncRef(Some(_)) => "func:funcref".to_string(),
        Val::ExternRef(None) => "null:externref".to_string(),
        Val::ExternRef(Some(_)) => "ref:externref".to_string(),
        Val::V128(v) => format!("{:#034x}:v128", v.as_u128()),
        _ => "?".to_string(),
    }
}

/// Comma-separated values, without brackets.
pub fn format_vals(vals: &[Val]) -> String {
    vals.iter().map(format_val).collect::<Vec<_>>().join(", ")
}

fn join_kinds(kinds: &[ValKind]) -> String {
    kinds.iter().map(ValKind::to_string).collect::<Vec<_>>().join(", ")
}

/// `(i32, i64, i32) -> (i32)`.
pub fn format_signature(params: &[ValKind], results: &[ValKind]) -> String {
    format!("({}) -> ({})", join_kinds(params), join_kinds(results))
}

fn format_func_type(ty: &FuncType) -> String {
    let params: Vec<String> = ty.params().map(|t| t.to_string()).collect();
    let results: Vec<String> = ty.results().map(|t| t.to_string()).collect();
    format!("({}) -> ({})", params.join(", "), results.join(", "))
}

/// `func wasi_snapshot_preview1::proc_exit(i32) -> ()`.
pub fn format_import(import: &ImportDescriptor) -> String {
    match (&import.kind, &import.signature) {
        (ImportKind::Func, Some(sig)) => format!(
            "func {}::{}{}",
            import.module,
            import.name,
            format_signature(&sig.params, &sig.results)
        ),
        (kind, _) => format!("{} {}::{}", kind, import.module, import.name),
    }
}

pub fn format_export(export: &ExportType<'_>) -> String {
    match export.ty() {
        ExternType::Func(ty) => format!("func {}{}", export.name(), format_func_type(&ty)),
        ExternType::Global(_) => format!("global {}", export.name()),
        ExternType::Table(_) => format!("table {}", export.name()),
        ExternType::Memory(ty) => format!("memory {} (min {} pages)", export.name(), ty.minimum()),
        _ => format!("other {}", export.name()),
    }
}

/// One import per line, in declared order.
pub fn format_module_imports(module: &Module) -> String {
    describe_imports(module)
        .iter()
        .map(format_import)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One export per line, in declared order.
pub fn format_module_exports(module: &Module) -> String {
    module
        .exports()
        .map(|e| format_export(&e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `name(args) -> (results)`.
pub fn format_call(name: &str, args: &[Val], results: &[Val]) -> String {
    format!("{}({}) -> ({})", name, format_vals(args), format_vals(results))
}

/// `module @ 0x0001a2 = 7.0x00002c`, with the function name appended when known.
pub fn format_frame(frame: &FrameInfo) -> String {
    let module = frame.module().name().unwrap_or("<module>");
    let mut line = format!(
        "{} @ {:#08x} = {}.{:#08x}",
        module,
        frame.module_offset().unwrap_or(0),
        frame.func_index(),
        frame.func_offset().unwrap_or(0),
    );
    if let Some(name) = frame.func_name() {
        line.push_str(&format!(" ({})", name));
    }
    line
}
