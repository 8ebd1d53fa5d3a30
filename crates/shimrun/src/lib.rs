//! # Shimrun
//!
//! Glue between the engine and the shim: reads module bytes, compiles them,
//! resolves imports into a positional vector, instantiates, invokes the entry
//! export, and turns traps into readable reports.

use std::path::Path;
use std::path::PathBuf;

use tracing::info;
use wasmtime::Engine;
use wasmtime::Instance;
use wasmtime::Module;
use wasmtime::Store;
use wasmtime::Val;
use wasmtime::WasmBacktrace;

use shimcall::display::format_frame;
use shimcall::display::format_signature;
use shimcall::resolve::build_import_vector;
use shimcall::Fallback;
use shimcall::Registry;
use shimcall::ResolveError;
use shimcall::ShimCtx;
use shimcall::ShimTrap;
use shimcall::ValKind;

#[derive(Debug)]
pub enum Error {
    Engine(wasmtime::Error),
    Read { path: PathBuf, source: std::io::Error },
    Compile(wasmtime::Error),
    Resolve(ResolveError),
    Instantiate(wasmtime::Error),
    MissingExport(String),
    /// The entry export exists but takes parameters or uses unsupported types.
    EntrySignature { name: String, signature: String },
    Trap(TrapReport),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "Engine error: {}", e),
            Self::Read { path, source } => write!(f, "Cannot read {}: {}", path.display(), source),
            Self::Compile(e) => write!(f, "Compile error: {:#}", e),
            Self::Resolve(e) => write!(f, "Resolve error: {}", e),
            Self::Instantiate(e) => write!(f, "Instantiate error: {:#}", e),
            Self::MissingExport(name) => write!(f, "Module has no exported function '{}'", name),
            Self::EntrySignature { name, signature } => {
                write!(f, "Cannot invoke '{}': expected no parameters, found {}", name, signature)
            }
            Self::Trap(report) => write!(f, "{}", report),
        }
    }
}

impl std::error::Error for Error {}

impl From<ResolveError> for Error {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Exit status requested by the guest, if it ended through `proc_exit`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Trap(report) => report.exit,
            _ => None,
        }
    }
}

/// A guest trap, rendered for humans.
#[derive(Debug, Clone)]
pub struct TrapReport {
    pub message: String,
    /// Innermost wasm frame, where the trap was raised.
    pub origin: Option<String>,
    /// Every wasm frame, innermost first.
    pub frames: Vec<String>,
    /// Set when the trap is `proc_exit`.
    pub exit: Option<i32>,
}

impl TrapReport {
    pub fn from_error(err: &wasmtime::Error) -> Self {
        let shim = err.downcast_ref::<ShimTrap>();
        let message = match shim {
            Some(trap) => trap.to_string(),
            None => err.root_cause().to_string(),
        };
        let frames: Vec<String> = err
            .downcast_ref::<WasmBacktrace>()
            .map(|bt| bt.frames().iter().map(format_frame).collect())
            .unwrap_or_default();

        Self {
            message,
            origin: frames.first().cloned(),
            frames,
            exit: shim.and_then(ShimTrap::exit_code),
        }
    }
}

impl std::fmt::Display for TrapReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trap: {}", self.message)?;
        if let Some(origin) = &self.origin {
            write!(f, "\n  at {}", origin)?;
        }
        if !self.frames.is_empty() {
            write!(f, "\nwasm backtrace:")?;
            for (i, frame) in self.frames.iter().enumerate() {
                write!(f, "\n  {:>3}: {}", i, frame)?;
            }
        }
        Ok(())
    }
}

/// Compiles and instantiates preview1 modules against a shared engine.
pub struct Runner {
    engine: Engine,
    registry: Registry,
    fallback: Fallback,
}

impl Runner {
    pub fn new() -> Result<Self> {
        let config = wasmtime::Config::new();
        let engine = Engine::new(&config).map_err(Error::Engine)?;
        Ok(Self::with_engine(engine))
    }

    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            registry: Registry::preview1(),
            fallback: Fallback::Reject,
        }
    }

    /// How to treat imports the registry cannot satisfy.
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Reads and compiles a `.wasm` or `.wat` file.
    pub fn load(&self, path: &Path) -> Result<Module> {
        let bytes = std::fs::read(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile(&bytes)
    }

    pub fn compile(&self, bytes: &[u8]) -> Result<Module> {
        let module = Module::new(&self.engine, bytes).map_err(Error::Compile)?;
        info!(imports = module.imports().len(), exports = module.exports().len(), "compiled module");
        Ok(module)
    }

    pub fn instantiate(&self, module: &Module, ctx: ShimCtx) -> Result<Session> {
        let mut store = Store::new(&self.engine, ctx);
        let externs = build_import_vector(&mut store, module, &self.registry).into_externs(&mut store, self.fallback)?;
        let instance = Instance::new(&mut store, module, &externs).map_err(Error::Instantiate)?;
        info!(imports = externs.len(), "instantiated module");
        Ok(Session { store, instance })
    }
}

/// A live instance and the store that owns its context.
pub struct Session {
    store: Store<ShimCtx>,
    instance: Instance,
}

impl Session {
    /// Calls a parameterless export and returns whatever it returns.
    pub fn invoke(&mut self, name: &str) -> Result<Vec<Val>> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| Error::MissingExport(name.to_string()))?;
        let ty = func.ty(&self.store);

        let params: Option<Vec<ValKind>> = ty.params().map(|t| ValKind::from_val_type(&t)).collect();
        let results: Option<Vec<ValKind>> = ty.results().map(|t| ValKind::from_val_type(&t)).collect();
        let (Some(params), Some(results)) = (params, results) else {
            return Err(Error::EntrySignature {
                name: name.to_string(),
                signature: "a type that cannot cross the host boundary".to_string(),
            });
        };
        if !params.is_empty() {
            return Err(Error::EntrySignature {
                name: name.to_string(),
                signature: format_signature(&params, &results),
            });
        }

        let mut out: Vec<Val> = results.iter().map(|k| k.zero()).collect();
        info!(export = name, "invoking");
        func.call(&mut self.store, &[], &mut out)
            .map_err(|e| Error::Trap(TrapReport::from_error(&e)))?;
        Ok(out)
    }

    pub fn ctx(&self) -> &ShimCtx {
        self.store.data()
    }

    pub fn store_mut(&mut self) -> &mut Store<ShimCtx> {
        &mut self.store
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}
