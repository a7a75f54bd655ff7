//! Names provided by the host environment.

/// Globals that resolve without a declaration.
pub const BUILTIN_GLOBALS: &[&str] = &[
    "console",
    "Math",
    "JSON",
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Symbol",
    "Date",
    "RegExp",
    "Error",
    "TypeError",
    "RangeError",
    "Promise",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "Infinity",
    "NaN",
    "undefined",
    "globalThis",
    "window",
    "document",
    "alert",
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "require",
    "module",
    "exports",
    "process",
];

pub fn is_builtin_global(name: &str) -> bool {
    BUILTIN_GLOBALS.contains(&name)
}
