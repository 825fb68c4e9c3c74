//! Standard library lookup tables.
//!
//! Three kinds of data drive the backporter:
//! - `typing_extensions` backports: symbols that `typing_extensions` provides
//!   for targets older than the version that added them to their home module;
//! - relocations: symbols that must be spelled differently before a version
//!   (`asyncio.QueueShutDown` becomes `Exception`, `typing.List` becomes `list`);
//! - denylists: names and base classes that cannot be expressed at all before
//!   a version.
//!
//! Tables are keyed by fully-qualified name and built once on first use.

use crate::{MODULE_BUILTINS, MODULE_TYPING, MODULE_TYPING_EXTENSIONS};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use unpy_common::{PythonVersion, Version, VersionInterval};

const fn v(major: u8, minor: u8) -> Version {
    Version::new(major, minor)
}

/// Names that cannot be used before the given version.
const UNSUPPORTED_NAMES: &[(&str, Version)] = &[
    ("annotationlib.ForwardRef", v(3, 14)),
    ("ast.TryStar", v(3, 11)),
    ("ast.TypeAlias", v(3, 12)),
    ("ast.TypeVar", v(3, 12)),
    ("ast.TypeVarTuple", v(3, 12)),
    ("ast.ParamSpec", v(3, 12)),
    ("ast.PyCF_OPTIMIZED_AST", v(3, 13)),
    ("asyncio.Barrier", v(3, 11)),
    ("asyncio.Runner", v(3, 11)),
    ("asyncio.TaskGroup", v(3, 11)),
    ("builtins._IncompleteInputError", v(3, 13)),
    ("builtins.BaseExceptionGroup", v(3, 11)),
    ("builtins.ExceptionGroup", v(3, 11)),
    ("builtins.reveal_locals", Version::NEVER),
    ("builtins.reveal_type", Version::NEVER),
    ("enum.verify", v(3, 11)),
    ("enum.member", v(3, 11)),
    ("enum.property", v(3, 11)),
    ("enum.global_enum", v(3, 11)),
    ("functools.cache", Version::NEVER),
    ("functools.lru_cache", Version::NEVER),
    ("functools.singledispatch", Version::NEVER),
    ("inspect.markcoroutinefunction", Version::NEVER),
    ("typing.ByteString", Version::NEVER),
    ("typing.Text", Version::NEVER),
    ("typing.assert_never", Version::NEVER),
    ("typing.assert_type", Version::NEVER),
    ("typing.clear_overloads", Version::NEVER),
    ("typing.no_type_check_decorator", Version::NEVER),
    ("typing.reveal_type", Version::NEVER),
    ("wsgiref.types.WSGIEnvironment", v(3, 11)),
    ("wsgiref.types.WSGIApplication", v(3, 11)),
    ("wsgiref.types.StartResponse", v(3, 11)),
    ("wsgiref.types.InputStream", v(3, 11)),
    ("wsgiref.types.ErrorStream", v(3, 11)),
    ("wsgiref.types.FileWrapper", v(3, 11)),
];

/// Base classes that cannot be subclassed in a stub before the given version.
const UNSUPPORTED_BASES: &[(&str, Version)] = &[
    ("builtins.bool", Version::NEVER),
    ("builtins.object", Version::NEVER),
    ("calendar.Month", v(3, 12)),
    ("calendar.Day", v(3, 12)),
    ("inspect.BufferFlags", v(3, 12)),
    ("inspect.FrameInfo", v(3, 11)),
    ("inspect.Traceback", v(3, 11)),
    ("pathlib.PurePath", v(3, 12)),
    ("pathlib.Path", v(3, 12)),
];

/// Symbols with a `typing_extensions` backport, and the version that added
/// them to their home module.
const TYPING_EXTENSIONS_BACKPORTS: &[(&str, Version)] = &[
    ("annotationlib.Format", v(3, 14)),
    ("collections.abc.Buffer", v(3, 12)),
    ("typing.Concatenate", v(3, 10)),
    ("typing.ParamSpec", v(3, 10)),
    ("typing.ParamSpecArgs", v(3, 10)),
    ("typing.ParamSpecKwargs", v(3, 10)),
    ("typing.TypeAlias", v(3, 10)),
    ("typing.TypeGuard", v(3, 10)),
    ("typing.is_typeddict", v(3, 10)),
    ("typing.LiteralString", v(3, 11)),
    ("typing.Never", v(3, 11)),
    ("typing.NotRequired", v(3, 11)),
    ("typing.Required", v(3, 11)),
    ("typing.Self", v(3, 11)),
    ("typing.TypeVarTuple", v(3, 11)),
    ("typing.Unpack", v(3, 11)),
    ("typing.dataclass_transform", v(3, 11)),
    ("typing.TypeAliasType", v(3, 12)),
    ("typing.override", v(3, 12)),
    ("typing.NoDefault", v(3, 13)),
    ("typing.ReadOnly", v(3, 13)),
    ("typing.TypeIs", v(3, 13)),
    ("typing.get_protocol_members", v(3, 13)),
    ("typing.is_protocol", v(3, 13)),
    ("typing.Doc", v(3, 14)),
    ("typing.TypeForm", v(3, 14)),
    ("typing.evaluate_forward_ref", v(3, 14)),
    ("types.CapsuleType", v(3, 13)),
    ("warnings.deprecated", v(3, 13)),
];

/// `(old fqn, new module, new name, version)`. A dotted new name is an
/// attribute path inside the new module.
const RELOCATIONS: &[(&str, &str, &str, Version)] = &[
    ("asyncio.BrokenBarrierError", MODULE_BUILTINS, "RuntimeError", v(3, 11)),
    ("asyncio.QueueShutDown", MODULE_BUILTINS, "Exception", v(3, 13)),
    ("builtins.EncodingWarning", MODULE_BUILTINS, "Warning", v(3, 10)),
    ("builtins.PythonFinalizationError", MODULE_BUILTINS, "RuntimeError", v(3, 13)),
    ("calendar.Month", MODULE_BUILTINS, "int", v(3, 12)),
    ("calendar.Day", MODULE_BUILTINS, "int", v(3, 12)),
    ("datetime.UTC", "datetime", "timezone.utc", v(3, 11)),
    ("dbm.sqlite3.error", MODULE_BUILTINS, "OSError", v(3, 13)),
    ("enum.EnumType", "enum", "EnumMeta", v(3, 11)),
    ("enum.ReprEnum", "enum", "Enum", v(3, 11)),
    ("enum.StrEnum", "enum", "Enum", v(3, 11)),
    ("inspect.BufferFlags", MODULE_BUILTINS, "int", v(3, 12)),
    ("pathlib.UnsupportedOperation", MODULE_BUILTINS, "NotImplementedError", v(3, 13)),
    ("queue.ShutDown", MODULE_BUILTINS, "Exception", v(3, 13)),
    ("re.PatternError", "re", "error", v(3, 13)),
    ("sys.monitoring.events", MODULE_BUILTINS, "int", v(3, 12)),
    ("types.EllipsisType", MODULE_BUILTINS, "type", v(3, 10)),
    ("types.NoneType", MODULE_BUILTINS, "type", v(3, 10)),
    ("types.NotImplementedType", MODULE_BUILTINS, "type", v(3, 10)),
    ("types.UnionType", MODULE_TYPING, "_UnionGenericAlias", v(3, 10)),
];

/// Deprecated `typing` aliases and their replacements. Applied to both
/// `typing` and `typing_extensions`, at every target.
const DEPRECATED_TYPING_ALIASES: &[(&str, &str, &str)] = &[
    ("Text", MODULE_BUILTINS, "str"),
    ("Dict", MODULE_BUILTINS, "dict"),
    ("List", MODULE_BUILTINS, "list"),
    ("Set", MODULE_BUILTINS, "set"),
    ("FrozenSet", MODULE_BUILTINS, "frozenset"),
    ("Tuple", MODULE_BUILTINS, "tuple"),
    ("Type", MODULE_BUILTINS, "type"),
    ("IntVar", "", "TypeVar"),
    ("runtime", "", "runtime_checkable"),
    ("DefaultDict", "collections", "defaultdict"),
    ("Deque", "collections", "deque"),
    ("ChainMap", "collections", "ChainMap"),
    ("Counter", "collections", "Counter"),
    ("OrderedDict", "collections", "OrderedDict"),
    ("AbstractSet", "collections.abc", "Set"),
    ("Collection", "collections.abc", "Collection"),
    ("Container", "collections.abc", "Container"),
    ("ItemsView", "collections.abc", "ItemsView"),
    ("KeysView", "collections.abc", "KeysView"),
    ("ValuesView", "collections.abc", "ValuesView"),
    ("Mapping", "collections.abc", "Mapping"),
    ("MappingView", "collections.abc", "MappingView"),
    ("MutableMapping", "collections.abc", "MutableMapping"),
    ("MutableSequence", "collections.abc", "MutableSequence"),
    ("MutableSet", "collections.abc", "MutableSet"),
    ("Sequence", "collections.abc", "Sequence"),
    ("Coroutine", "collections.abc", "Coroutine"),
    ("AsyncGenerator", "collections.abc", "AsyncGenerator"),
    ("AsyncIterable", "collections.abc", "AsyncIterable"),
    ("AsyncIterator", "collections.abc", "AsyncIterator"),
    ("Awaitable", "collections.abc", "Awaitable"),
    ("Iterable", "collections.abc", "Iterable"),
    ("Iterator", "collections.abc", "Iterator"),
    ("Callable", "collections.abc", "Callable"),
    ("Generator", "collections.abc", "Generator"),
    ("Hashable", "collections.abc", "Hashable"),
    ("Reversible", "collections.abc", "Reversible"),
    ("Sized", "collections.abc", "Sized"),
    ("ContextManager", "contextlib", "AbstractContextManager"),
    ("AsyncContextManager", "contextlib", "AbstractAsyncContextManager"),
    ("Pattern", "re", "Pattern"),
    ("Match", "re", "Match"),
];

/// Where a symbol has to be imported from when the target predates `until`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Relocation {
    pub module: &'static str,
    /// Symbol in `module`; may be an attribute path such as `timezone.utc`.
    pub name: &'static str,
    pub until: Version,
}

impl Relocation {
    /// Versions at which the old spelling is unavailable.
    pub fn active_range(&self) -> VersionInterval {
        VersionInterval::between(v(3, 0), self.until)
    }

    /// Whether the relocation applies at `target`.
    pub fn is_active(&self, target: PythonVersion) -> bool {
        self.active_range().contains(target.version())
    }

    /// The importable first segment of `name`.
    pub fn head(&self) -> &'static str {
        self.name.split_once('.').map_or(self.name, |(head, _)| head)
    }

    /// The attribute path after the first segment, if any.
    pub fn tail(&self) -> Option<&'static str> {
        self.name.split_once('.').map(|(_, tail)| tail)
    }

    pub fn is_builtin(&self) -> bool {
        self.module == MODULE_BUILTINS
    }
}

/// Read-only version knowledge consulted by the collector and the lowering pass.
pub trait BackportTable {
    /// Version at which `module.symbol` became available in `module`, for
    /// symbols that have a `typing_extensions` backport.
    fn lookup(&self, module: &str, symbol: &str) -> Option<PythonVersion>;

    /// Where `module.symbol` must come from before `Relocation::until`.
    fn relocation(&self, module: &str, symbol: &str) -> Option<Relocation>;

    /// Whether any symbol of `module` is relocated by this table.
    fn relocates_from(&self, module: &str) -> bool;

    /// Version at which the fully-qualified name may be referenced.
    fn unsupported_name(&self, fq_name: &str) -> Option<Version>;

    /// Version at which the fully-qualified name may be used as a base class.
    fn unsupported_base(&self, fq_name: &str) -> Option<Version>;
}

struct Tables {
    backports: FxHashMap<&'static str, PythonVersion>,
    relocations: FxHashMap<String, Relocation>,
    relocated_modules: FxHashSet<&'static str>,
    unsupported_names: FxHashMap<&'static str, Version>,
    unsupported_bases: FxHashMap<&'static str, Version>,
}

fn split_fq_name(fq_name: &str) -> (&str, &str) {
    fq_name.rsplit_once('.').unwrap_or(("", fq_name))
}

static TABLES: Lazy<Tables> = Lazy::new(|| {
    let mut backports = FxHashMap::default();
    let mut relocations: FxHashMap<String, Relocation> = FxHashMap::default();
    let mut relocated_modules = FxHashSet::default();

    for &(fq_name, module, name, until) in RELOCATIONS {
        relocated_modules.insert(split_fq_name(fq_name).0);
        relocations.insert(fq_name.to_string(), Relocation { module, name, until });
    }

    for &(fq_name, until) in TYPING_EXTENSIONS_BACKPORTS {
        let (module, name) = split_fq_name(fq_name);
        if let Some(target) = PythonVersion::from_version(until) {
            backports.insert(fq_name, target);
        }
        relocated_modules.insert(module);
        relocations.insert(
            fq_name.to_string(),
            Relocation {
                module: MODULE_TYPING_EXTENSIONS,
                name,
                until,
            },
        );
    }

    for typing_module in [MODULE_TYPING, MODULE_TYPING_EXTENSIONS] {
        relocated_modules.insert(typing_module);
        for &(alias, module, name) in DEPRECATED_TYPING_ALIASES {
            let module = if module.is_empty() { typing_module } else { module };
            relocations.insert(
                format!("{typing_module}.{alias}"),
                Relocation {
                    module,
                    name,
                    until: Version::NEVER,
                },
            );
        }
    }

    Tables {
        backports,
        relocations,
        relocated_modules,
        unsupported_names: UNSUPPORTED_NAMES.iter().copied().collect(),
        unsupported_bases: UNSUPPORTED_BASES.iter().copied().collect(),
    }
});

/// The built-in tables for the Python standard library.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdlibBackports;

impl BackportTable for StdlibBackports {
    fn lookup(&self, module: &str, symbol: &str) -> Option<PythonVersion> {
        TABLES
            .backports
            .get(format!("{module}.{symbol}").as_str())
            .copied()
    }

    fn relocation(&self, module: &str, symbol: &str) -> Option<Relocation> {
        TABLES
            .relocations
            .get(format!("{module}.{symbol}").as_str())
            .copied()
    }

    fn relocates_from(&self, module: &str) -> bool {
        TABLES.relocated_modules.contains(module)
    }

    fn unsupported_name(&self, fq_name: &str) -> Option<Version> {
        TABLES.unsupported_names.get(fq_name).copied()
    }

    fn unsupported_base(&self, fq_name: &str) -> Option<Version> {
        TABLES.unsupported_bases.get(fq_name).copied()
    }
}
