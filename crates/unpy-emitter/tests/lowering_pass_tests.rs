use super::*;
use unpy_binder::{CollectorState, StdlibBackports};
use unpy_common::PythonVersion;
use unpy_parser::ParserState;

fn lower(source: &str, target: PythonVersion) -> String {
    let mut parser = ParserState::new("test.pyi", source);
    let module = parser.parse_module();
    assert!(
        parser.get_diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        parser.get_diagnostics()
    );
    let arena = parser.into_arena();
    let collected = CollectorState::new(&arena, target, &StdlibBackports)
        .run(module)
        .unwrap_or_else(|err| panic!("collecting {source:?} failed: {err}"));
    let transforms = LoweringPass::new(&arena, &collected, &StdlibBackports).run();
    Printer::new(&arena).print(&transforms)
}

fn assert_lowered(source: &str, target: PythonVersion, expected: &str) {
    assert_eq!(lower(source, target), expected, "lowering {source:?} at {target}");
}

// =============================================================================
// Generic declarations
// =============================================================================

#[test]
fn test_generic_function() {
    assert_lowered(
        "def spam[T](x: T) -> T: ...\n",
        PythonVersion::Py311,
        "from typing import TypeVar\n\nT = TypeVar(\"T\")\ndef spam(x: T) -> T: ...\n",
    );
}

#[test]
fn test_generic_function_is_kept_at_313() {
    let source = "def spam[T](x: T) -> T: ...\n";
    assert_lowered(source, PythonVersion::Py313, source);
}

#[test]
fn test_class_variance() {
    assert_lowered(
        "class C[T_contra, T, T_co]: ...\n",
        PythonVersion::Py310,
        "\
from typing import Generic
from typing_extensions import TypeVar

T_contra = TypeVar(\"T_contra\", contravariant=True)
T = TypeVar(\"T\", infer_variance=True)
T_co = TypeVar(\"T_co\", covariant=True)
class C(Generic[T_contra, T, T_co]): ...
",
    );
}

#[test]
fn test_generic_goes_after_positional_bases() {
    assert_lowered(
        "class C[T_co](Base, metaclass=M): ...\n",
        PythonVersion::Py311,
        "\
from typing import Generic, TypeVar

T_co = TypeVar(\"T_co\", covariant=True)
class C(Base, Generic[T_co], metaclass=M): ...
",
    );
}

#[test]
fn test_generic_goes_before_keyword_arguments() {
    assert_lowered(
        "class C[T_co](metaclass=M): ...\n",
        PythonVersion::Py311,
        "\
from typing import Generic, TypeVar

T_co = TypeVar(\"T_co\", covariant=True)
class C(Generic[T_co], metaclass=M): ...
",
    );
}

#[test]
fn test_protocol_base_is_subscripted() {
    assert_lowered(
        "\
from typing import Protocol

class P[T_co](Protocol):
    def get(self) -> T_co: ...
",
        PythonVersion::Py311,
        "\
from typing import Protocol, TypeVar

T_co = TypeVar(\"T_co\", covariant=True)
class P(Protocol[T_co]):
    def get(self) -> T_co: ...
",
    );
}

#[test]
fn test_nested_declaration_hoists_to_root() {
    assert_lowered(
        "class C:\n    def m[T](self, x: T) -> T: ...\n",
        PythonVersion::Py310,
        "\
from typing import TypeVar

T = TypeVar(\"T\")
class C:
    def m(self, x: T) -> T: ...
",
    );
}

#[test]
fn test_variadic_unpacks_before_311() {
    assert_lowered(
        "def f[*Ts](*args: *Ts) -> tuple[*Ts]: ...\n",
        PythonVersion::Py310,
        "\
from typing_extensions import TypeVarTuple, Unpack

Ts = TypeVarTuple(\"Ts\")
def f(*args: Unpack[Ts]) -> tuple[Unpack[Ts]]: ...
",
    );
}

#[test]
fn test_constructor_through_module_import() {
    assert_lowered(
        "import typing\n\ndef f[T](x: T) -> T: ...\n",
        PythonVersion::Py311,
        "import typing\n\nT = typing.TypeVar(\"T\")\ndef f(x: T) -> T: ...\n",
    );
}

// =============================================================================
// Type aliases
// =============================================================================

#[test]
fn test_plain_type_alias() {
    assert_lowered(
        "type Alias = int\n",
        PythonVersion::Py311,
        "from typing import TypeAlias\n\nAlias: TypeAlias = int\n",
    );
}

#[test]
fn test_generic_type_alias() {
    assert_lowered(
        "type Pair[K, V] = dict[K, V]\n",
        PythonVersion::Py311,
        "\
from typing import TypeVar
from typing_extensions import TypeAliasType

K = TypeVar(\"K\")
V = TypeVar(\"V\")
Pair = TypeAliasType(\"Pair\", dict[K, V], type_params=(K, V))
",
    );
}

#[test]
fn test_type_alias_with_default_at_312() {
    assert_lowered(
        "type P[K, V = int] = dict[K, V]\n",
        PythonVersion::Py312,
        "\
from typing import TypeAliasType
from typing_extensions import TypeVar

K = TypeVar(\"K\")
V = TypeVar(\"V\", default=int)
P = TypeAliasType(\"P\", dict[K, V], type_params=(K, V))
",
    );
}

// =============================================================================
// Relocations
// =============================================================================

#[test]
fn test_deprecated_alias_becomes_builtin() {
    assert_lowered(
        "from typing import List\n\nx: List[int]\n",
        PythonVersion::Py310,
        "\nx: list[int]\n",
    );
}

#[test]
fn test_relocation_to_typing_extensions() {
    assert_lowered(
        "\
from typing import override

class A:
    @override
    def f(self) -> None: ...
",
        PythonVersion::Py311,
        "\
from typing_extensions import override

class A:
    @override
    def f(self) -> None: ...
",
    );
}

#[test]
fn test_relocation_within_module() {
    assert_lowered(
        "from enum import StrEnum\n\nclass E(StrEnum): ...\n",
        PythonVersion::Py310,
        "from enum import Enum\n\nclass E(Enum): ...\n",
    );
}

#[test]
fn test_relocation_to_attribute_path() {
    assert_lowered(
        "import datetime\n\ntz: datetime.UTC\n",
        PythonVersion::Py310,
        "import datetime\n\ntz: datetime.timezone.utc\n",
    );
}

// =============================================================================
// Import placement
// =============================================================================

#[test]
fn test_addition_to_existing_import() {
    assert_lowered(
        "import sys\nfrom typing import Any\n\ndef f[T](x: T) -> T: ...\n",
        PythonVersion::Py311,
        "\
import sys
from typing import Any, TypeVar

T = TypeVar(\"T\")
def f(x: T) -> T: ...
",
    );
}

#[test]
fn test_new_import_after_last_import() {
    assert_lowered(
        "import sys\nx: int\ndef f[T](x: T) -> T: ...\n",
        PythonVersion::Py311,
        "\
import sys
from typing import TypeVar

T = TypeVar(\"T\")
x: int
def f(x: T) -> T: ...
",
    );
}

#[test]
fn test_new_import_before_later_module() {
    assert_lowered(
        "\
from collections import OrderedDict
from zoo import Animal

def f[T](x: T) -> Animal: ...
",
        PythonVersion::Py311,
        "\
from collections import OrderedDict
from typing import TypeVar
from zoo import Animal

T = TypeVar(\"T\")
def f(x: T) -> Animal: ...
",
    );
}

#[test]
fn test_new_import_after_docstring() {
    assert_lowered(
        "\"\"\"Docs.\"\"\"\n\ndef f[T](x: T) -> T: ...\n",
        PythonVersion::Py311,
        "\
\"\"\"Docs.\"\"\"

from typing import TypeVar

T = TypeVar(\"T\")
def f(x: T) -> T: ...
",
    );
}

#[test]
fn test_multiline_import_keeps_layout() {
    assert_lowered(
        "\
from typing import (
    Any,
    List,
)

x: List[Any]
def f[T](x: T) -> T: ...
",
        PythonVersion::Py311,
        "\
from typing import (
    Any,
    TypeVar,
)

T = TypeVar(\"T\")
x: list[Any]
def f(x: T) -> T: ...
",
    );
}

#[test]
fn test_emptied_import_before_semicolon() {
    assert_lowered(
        "from typing import override; x: int\n",
        PythonVersion::Py310,
        "from typing_extensions import override\n\nx: int\n",
    );
}

#[test]
fn test_emptied_import_after_semicolon() {
    assert_lowered(
        "x: int; from typing import override\n",
        PythonVersion::Py310,
        "x: int\nfrom typing_extensions import override\n",
    );
}

// =============================================================================
// Declaration placement
// =============================================================================

#[test]
fn test_declarations_go_before_first_definition() {
    assert_lowered(
        "import os\n\nclass A: ...\ndef f[T](x: T) -> T: ...\n",
        PythonVersion::Py311,
        "\
import os
from typing import TypeVar

T = TypeVar(\"T\")
class A: ...
def f(x: T) -> T: ...
",
    );
}

#[test]
fn test_declarations_follow_dunder_all() {
    assert_lowered(
        "\
from typing import Any
__all__ = [\"f\"]

x: Any
def f[T](x: T) -> T: ...
",
        PythonVersion::Py311,
        "\
from typing import Any, TypeVar
__all__ = [\"f\"]

T = TypeVar(\"T\")
x: Any
def f(x: T) -> T: ...
",
    );
}

#[test]
fn test_declarations_are_grouped() {
    assert_lowered(
        "def f[T](x: T) -> T: ...\nclass A: ...\ndef g[U](x: U) -> U: ...\n",
        PythonVersion::Py311,
        "\
from typing import TypeVar

T = TypeVar(\"T\")
U = TypeVar(\"U\")
def f(x: T) -> T: ...
class A: ...
def g(x: U) -> U: ...
",
    );
}

#[test]
fn test_declarations_follow_conditional_imports() {
    assert_lowered(
        "\
import sys
if sys.version_info >= (3, 11):
    from enum import Enum

class B[T]: ...
",
        PythonVersion::Py311,
        "\
import sys
from typing import Generic
from typing_extensions import TypeVar

if sys.version_info >= (3, 11):
    from enum import Enum

T = TypeVar(\"T\", infer_variance=True)
class B(Generic[T]): ...
",
    );
}

#[test]
fn test_nothing_to_lower() {
    let mut parser = ParserState::new("test.pyi", "from typing import Any\n\nx: Any\n");
    let module = parser.parse_module();
    let arena = parser.into_arena();
    let collected = CollectorState::new(&arena, PythonVersion::Py310, &StdlibBackports)
        .run(module)
        .unwrap();
    let transforms = LoweringPass::new(&arena, &collected, &StdlibBackports).run();
    assert!(transforms.is_empty());
}
