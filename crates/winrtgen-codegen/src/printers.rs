//! Per-type printers
//!
//! Each printer writes the textual projection of one type into a writer for
//! one emission phase. Printers route every cross-namespace type they name
//! through `Writer::add_depends`; the dependency collector and the module
//! planner see nothing else.

use std::fmt::Write as _;

use winrtgen_core::{Method, Settings, TypeDef, TypeKind, TypeName, TypeRef};

use crate::error::CodegenError;
use crate::writer::Writer;

type Result<T = ()> = std::result::Result<T, CodegenError>;

pub fn cpp_namespace(namespace: &str) -> String {
    namespace.replace('.', "::")
}

fn flat_namespace(namespace: &str) -> String {
    namespace.replace('.', "_")
}

fn primitive_cpp(name: &str) -> &str {
    match name {
        "Int8" => "int8_t",
        "UInt8" => "uint8_t",
        "Int16" => "int16_t",
        "UInt16" => "uint16_t",
        "Int32" => "int32_t",
        "UInt32" => "uint32_t",
        "Int64" => "int64_t",
        "UInt64" => "uint64_t",
        "Single" => "float",
        "Double" => "double",
        "Boolean" => "bool",
        "Char" => "char16_t",
        "String" => "hstring",
        "Guid" => "winrt::guid",
        "Object" => "winrt::Windows::Foundation::IInspectable",
        other => other,
    }
}

fn abi_primitive_cpp(name: &str) -> &str {
    match name {
        "String" | "Object" => "void*",
        "Guid" => "winrt::guid",
        other => primitive_cpp(other),
    }
}

/// Projected name of a referenced type, recording the dependency.
fn named_cpp(w: &mut Writer, name: &TypeName) -> String {
    w.add_depends(name);
    format!("winrt::{}::{}", cpp_namespace(&name.namespace), name.name)
}

fn type_cpp(w: &mut Writer, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive(p) => primitive_cpp(p).to_string(),
        TypeRef::Named(n) => named_cpp(w, n),
    }
}

/// ABI view of a type reference. Named types flatten to void*, but the
/// reference is still recorded so the dependency graph matches the
/// projected signature.
fn abi_type_cpp(w: &mut Writer, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive(p) => abi_primitive_cpp(p).to_string(),
        TypeRef::Named(n) => {
            w.add_depends(n);
            "void*".to_string()
        }
    }
}

fn param_list(w: &mut Writer, method: &Method) -> String {
    method
        .params
        .iter()
        .map(|p| format!("{} {}", type_cpp(w, &p.ty), p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn abi_param_list(w: &mut Writer, method: &Method) -> String {
    let mut parts: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{} {}", abi_type_cpp(w, &p.ty), p.name))
        .collect();
    if let Some(ret) = &method.return_type {
        parts.push(format!("{}* winrt_impl_result", abi_type_cpp(w, ret)));
    }
    parts.join(", ")
}

/// `WINRT_EXPORT namespace winrt::<ns> { ... }`
pub fn write_type_namespace(
    w: &mut Writer,
    namespace: &str,
    body: impl FnOnce(&mut Writer) -> Result,
) -> Result {
    writeln!(w, "WINRT_EXPORT namespace winrt::{}\n{{", cpp_namespace(namespace))?;
    body(w)?;
    writeln!(w, "}}")?;
    Ok(())
}

pub fn write_impl_namespace(w: &mut Writer, body: impl FnOnce(&mut Writer) -> Result) -> Result {
    writeln!(w, "namespace winrt::impl\n{{")?;
    body(w)?;
    writeln!(w, "}}")?;
    Ok(())
}

pub fn write_std_namespace(w: &mut Writer, body: impl FnOnce(&mut Writer) -> Result) -> Result {
    writeln!(w, "namespace std\n{{")?;
    body(w)?;
    writeln!(w, "}}")?;
    Ok(())
}

fn enum_underlying(flags: bool) -> &'static str {
    if flags {
        "uint32_t"
    } else {
        "int32_t"
    }
}

pub fn write_enum(w: &mut Writer, def: &TypeDef) -> Result {
    let TypeKind::Enum { flags, variants } = &def.kind else {
        return Ok(());
    };

    writeln!(w, "    enum class {} : {}\n    {{", def.name, enum_underlying(*flags))?;
    for variant in variants {
        writeln!(w, "        {} = {},", variant.name, variant.value)?;
    }
    writeln!(w, "    }};")?;
    Ok(())
}

pub fn write_forward(w: &mut Writer, def: &TypeDef) -> Result {
    match &def.kind {
        TypeKind::Enum { flags, .. } => {
            writeln!(w, "    enum class {} : {};", def.name, enum_underlying(*flags))?;
        }
        _ => writeln!(w, "    struct {};", def.name)?,
    }
    Ok(())
}

pub fn write_category(w: &mut Writer, ns: &str, def: &TypeDef, category: &str) -> Result {
    writeln!(
        w,
        "    template <> struct category<winrt::{}::{}> {{ using type = {}; }};",
        cpp_namespace(ns),
        def.name,
        category
    )?;
    Ok(())
}

pub fn write_struct_category(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Struct { fields } = &def.kind else {
        return Ok(());
    };

    let field_types = fields
        .iter()
        .map(|f| type_cpp(w, &f.ty))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(
        w,
        "    template <> struct category<winrt::{}::{}> {{ using type = struct_category<{}>; }};",
        cpp_namespace(ns),
        def.name,
        field_types
    )?;
    Ok(())
}

pub fn write_name(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    writeln!(
        w,
        "    template <> struct name<winrt::{}::{}> {{ static constexpr auto & value{{ L\"{}.{}\" }}; }};",
        cpp_namespace(ns),
        def.name,
        ns,
        def.name
    )?;
    Ok(())
}

fn guid_components(guid: &str) -> Result<(String, String, String, Vec<String>)> {
    let parts: Vec<&str> = guid.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    if parts.len() != 5 || parts.iter().zip(lengths).any(|(p, len)| p.len() != len) {
        return Err(CodegenError::Generation(format!("malformed GUID '{}'", guid)));
    }

    let mut data4 = Vec::with_capacity(8);
    for chunk in parts[3]
        .as_bytes()
        .chunks(2)
        .chain(parts[4].as_bytes().chunks(2))
    {
        data4.push(format!("0x{}", std::str::from_utf8(chunk).unwrap_or("00")));
    }

    Ok((
        format!("0x{}", parts[0]),
        format!("0x{}", parts[1]),
        format!("0x{}", parts[2]),
        data4,
    ))
}

pub fn write_guid(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let guid = match &def.kind {
        TypeKind::Interface { guid, .. } | TypeKind::Delegate { guid, .. } => guid,
        _ => return Ok(()),
    };

    let (data1, data2, data3, data4) = guid_components(guid)?;
    writeln!(
        w,
        "    template <> struct guid_storage<winrt::{}::{}>\n    {{\n        static constexpr guid value{{ {},{},{},{{ {} }} }};\n    }};",
        cpp_namespace(ns),
        def.name,
        data1,
        data2,
        data3,
        data4.join(",")
    )?;
    Ok(())
}

pub fn write_default_interface(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Class {
        default_interface: Some(default_interface),
        ..
    } = &def.kind
    else {
        return Ok(());
    };

    let target = named_cpp(w, default_interface);
    writeln!(
        w,
        "    template <> struct default_interface<winrt::{}::{}> {{ using type = {}; }};",
        cpp_namespace(ns),
        def.name,
        target
    )?;
    Ok(())
}

pub fn write_interface_abi(w: &mut Writer, ns: &str, def: &TypeDef, settings: &Settings) -> Result {
    let TypeKind::Interface { methods, .. } = &def.kind else {
        return Ok(());
    };

    writeln!(
        w,
        "    template <> struct abi<winrt::{}::{}>\n    {{\n        struct WINRT_IMPL_NOVTABLE type : inspectable_abi\n        {{",
        cpp_namespace(ns),
        def.name
    )?;
    for method in methods {
        let params = abi_param_list(w, method);
        writeln!(
            w,
            "            virtual int32_t __stdcall {}({}) noexcept = 0;",
            method.name, params
        )?;
    }
    writeln!(w, "        }};\n    }};")?;

    // A fast-ABI default interface carries its owning class's flattened
    // vtable; the class becomes an ordinary dependency of this header.
    if settings.fastabi {
        let full_name = format!("{}.{}", ns, def.name);
        if let Some(class) = settings.fastabi_cache.get(&full_name) {
            if let Some((class_ns, class_name)) = class.rsplit_once('.') {
                let owner = named_cpp(w, &TypeName::new(class_ns, class_name));
                writeln!(
                    w,
                    "    template <> struct fast_abi_owner<winrt::{}::{}> {{ using type = {}; }};",
                    cpp_namespace(ns),
                    def.name,
                    owner
                )?;
            }
        }
    }
    Ok(())
}

pub fn write_delegate_abi(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Delegate { method, .. } = &def.kind else {
        return Ok(());
    };

    let params = abi_param_list(w, method);
    writeln!(
        w,
        "    template <> struct abi<winrt::{}::{}>\n    {{\n        struct WINRT_IMPL_NOVTABLE type : unknown_abi\n        {{\n            virtual int32_t __stdcall Invoke({}) noexcept = 0;\n        }};\n    }};",
        cpp_namespace(ns),
        def.name,
        params
    )?;
    Ok(())
}

pub fn write_consume(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Interface { methods, .. } = &def.kind else {
        return Ok(());
    };

    writeln!(
        w,
        "    template <typename D> struct consume_{}_{}\n    {{",
        flat_namespace(ns),
        def.name
    )?;
    for method in methods {
        let params = param_list(w, method);
        writeln!(w, "        auto {}({}) const;", method.name, params)?;
    }
    writeln!(
        w,
        "    }};\n    template <> struct consume<winrt::{}::{}> {{ template <typename D> using type = consume_{}_{}<D>; }};",
        cpp_namespace(ns),
        def.name,
        flat_namespace(ns),
        def.name
    )?;
    Ok(())
}

pub fn write_struct_abi(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Struct { fields } = &def.kind else {
        return Ok(());
    };

    writeln!(w, "    struct struct_{}_{}\n    {{", flat_namespace(ns), def.name)?;
    for field in fields {
        let ty = abi_type_cpp(w, &field.ty);
        writeln!(w, "        {} {};", ty, field.name)?;
    }
    writeln!(
        w,
        "    }};\n    template <> struct abi<winrt::{}::{}> {{ using type = struct_{}_{}; }};",
        cpp_namespace(ns),
        def.name,
        flat_namespace(ns),
        def.name
    )?;
    Ok(())
}

pub fn write_interface(w: &mut Writer, def: &TypeDef) -> Result {
    let TypeKind::Interface { requires, .. } = &def.kind else {
        return Ok(());
    };

    let mut bases = format!(
        "Windows::Foundation::IInspectable,\n        impl::consume_t<{}>",
        def.name
    );
    if !requires.is_empty() {
        let required = requires
            .iter()
            .map(|r| named_cpp(w, r))
            .collect::<Vec<_>>()
            .join(", ");
        bases.push_str(&format!(
            ",\n        impl::require<{}, {}>",
            def.name, required
        ));
    }

    writeln!(
        w,
        "    struct WINRT_IMPL_EMPTY_BASES {0} :\n        {1}\n    {{\n        {0}(std::nullptr_t = nullptr) noexcept {{}}\n        {0}(void* ptr, take_ownership_from_abi_t) noexcept : Windows::Foundation::IInspectable(ptr, take_ownership_from_abi) {{}}\n    }};",
        def.name, bases
    )?;
    Ok(())
}

pub fn write_delegate(w: &mut Writer, def: &TypeDef) -> Result {
    let TypeKind::Delegate { method, .. } = &def.kind else {
        return Ok(());
    };

    let params = param_list(w, method);
    writeln!(
        w,
        "    struct {0} : Windows::Foundation::IUnknown\n    {{\n        {0}(std::nullptr_t = nullptr) noexcept {{}}\n        auto operator()({1}) const;\n    }};",
        def.name, params
    )?;
    Ok(())
}

/// Emits all struct definitions for the namespace. Returns the promote flag:
/// true when some struct embeds a type from another namespace by value, which
/// forces this namespace's `.2` header onto the dependency's `.2` rather than
/// its `.1`.
pub fn write_structs(w: &mut Writer, ns: &str, structs: &[TypeDef]) -> Result<bool> {
    let mut promote = false;

    for def in structs {
        let TypeKind::Struct { fields } = &def.kind else {
            continue;
        };

        writeln!(w, "    struct {}\n    {{", def.name)?;
        for field in fields {
            if field.ty.named().is_some_and(|n| n.namespace != ns) {
                promote = true;
            }
            let ty = type_cpp(w, &field.ty);
            writeln!(w, "        {} {};", ty, field.name)?;
        }
        writeln!(w, "    }};")?;
    }

    Ok(promote)
}

pub fn write_class(w: &mut Writer, def: &TypeDef) -> Result {
    let TypeKind::Class {
        default_interface, ..
    } = &def.kind
    else {
        return Ok(());
    };

    match default_interface {
        Some(default_interface) => {
            let base = named_cpp(w, default_interface);
            writeln!(
                w,
                "    struct WINRT_IMPL_EMPTY_BASES {0} : {1}\n    {{\n        {0}(std::nullptr_t) noexcept {{}}\n        {0}(void* ptr, take_ownership_from_abi_t) noexcept : {1}(ptr, take_ownership_from_abi) {{}}\n    }};",
                def.name, base
            )?;
        }
        None => {
            // Static class: activation only, no instance interface.
            writeln!(w, "    struct {0}\n    {{\n        {0}() = delete;\n    }};", def.name)?;
        }
    }
    Ok(())
}

pub fn write_interface_override(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Class { interfaces, .. } = &def.kind else {
        return Ok(());
    };
    if interfaces.is_empty() {
        return Ok(());
    }

    writeln!(
        w,
        "    template <typename D> struct {}Overrides_{}\n    {{",
        def.name,
        flat_namespace(ns)
    )?;
    for interface in interfaces {
        let target = named_cpp(w, interface);
        writeln!(w, "        operator {}() const;", target)?;
    }
    writeln!(w, "    }};")?;
    Ok(())
}

pub fn write_consume_definitions(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Interface { methods, .. } = &def.kind else {
        return Ok(());
    };

    for method in methods {
        let params = param_list(w, method);
        let args = method
            .params
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            w,
            "    template <typename D> auto consume_{0}_{1}<D>::{2}({3}) const\n    {{\n        return impl::call<winrt::{4}::{1}>(*this, &abi_t<winrt::{4}::{1}>::{2}{5}{6});\n    }}",
            flat_namespace(ns),
            def.name,
            method.name,
            params,
            cpp_namespace(ns),
            if args.is_empty() { "" } else { ", " },
            args
        )?;
    }
    Ok(())
}

pub fn write_delegate_implementation(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Delegate { method, .. } = &def.kind else {
        return Ok(());
    };

    let params = abi_param_list(w, method);
    writeln!(
        w,
        "    template <typename H> struct delegate<winrt::{}::{}, H> final : implements_delegate<winrt::{0}::{1}, H>\n    {{\n        int32_t __stdcall Invoke({2}) noexcept final;\n    }};",
        cpp_namespace(ns),
        def.name,
        params
    )?;
    Ok(())
}

pub fn write_produce(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Interface { methods, .. } = &def.kind else {
        return Ok(());
    };

    writeln!(
        w,
        "    template <typename D> struct produce<D, winrt::{}::{}> : produce_base<D, winrt::{0}::{1}>\n    {{",
        cpp_namespace(ns),
        def.name
    )?;
    for method in methods {
        let params = abi_param_list(w, method);
        writeln!(
            w,
            "        int32_t __stdcall {}({}) noexcept final\n        {{\n            return 0;\n        }}",
            method.name, params
        )?;
    }
    writeln!(w, "    }};")?;
    Ok(())
}

pub fn write_enum_operators(w: &mut Writer, def: &TypeDef) -> Result {
    let TypeKind::Enum { flags: true, .. } = &def.kind else {
        return Ok(());
    };

    for (op, expr) in [
        ("|", "static_cast<uint32_t>(left) | static_cast<uint32_t>(right)"),
        ("&", "static_cast<uint32_t>(left) & static_cast<uint32_t>(right)"),
        ("^", "static_cast<uint32_t>(left) ^ static_cast<uint32_t>(right)"),
    ] {
        writeln!(
            w,
            "    constexpr auto operator{1}({0} const left, {0} const right) noexcept\n    {{\n        return static_cast<{0}>({2});\n    }}",
            def.name, op, expr
        )?;
    }
    writeln!(
        w,
        "    constexpr auto operator~({0} const value) noexcept\n    {{\n        return static_cast<{0}>(~static_cast<uint32_t>(value));\n    }}",
        def.name
    )?;
    Ok(())
}

pub fn write_class_definitions(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Class {
        default_interface: Some(default_interface),
        ..
    } = &def.kind
    else {
        return Ok(());
    };

    let factory = named_cpp(w, default_interface);
    writeln!(
        w,
        "    inline {0}::{0}(std::nullptr_t) noexcept :\n        {0}(impl::get_activation_factory<winrt::{1}::{0}, {2}>())\n    {{\n    }}",
        def.name,
        cpp_namespace(ns),
        factory
    )?;
    Ok(())
}

pub fn write_interface_override_methods(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    let TypeKind::Class { interfaces, .. } = &def.kind else {
        return Ok(());
    };

    for interface in interfaces {
        let target = named_cpp(w, interface);
        writeln!(
            w,
            "    template <typename D> inline {}Overrides_{}<D>::operator {}() const\n    {{\n        return static_cast<D const&>(*this).template try_as<{2}>();\n    }}",
            def.name,
            flat_namespace(ns),
            target
        )?;
    }
    Ok(())
}

pub fn write_fast_class_base(w: &mut Writer, ns: &str, def: &TypeDef, settings: &Settings) -> Result {
    let TypeKind::Class { fastabi: true, .. } = &def.kind else {
        return Ok(());
    };
    if !settings.fastabi {
        return Ok(());
    }

    writeln!(
        w,
        "    template <typename D> using fast_base_{0} = impl::fast_base<D, winrt::{1}::{0}>;",
        def.name,
        cpp_namespace(ns)
    )?;
    Ok(())
}

pub fn write_std_hash(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    writeln!(
        w,
        "    template <> struct hash<winrt::{}::{}> : winrt::impl::hash_base {{}};",
        cpp_namespace(ns),
        def.name
    )?;
    Ok(())
}

pub fn write_std_formatter(w: &mut Writer, ns: &str, def: &TypeDef) -> Result {
    writeln!(
        w,
        "    template <> struct formatter<winrt::{}::{}, wchar_t> : formatter<winrt::hstring, wchar_t> {{}};",
        cpp_namespace(ns),
        def.name
    )?;
    Ok(())
}
