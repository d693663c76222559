//! Fixed source bundle for the runtime library header
//!
//! The runtime projection library ships with the generator as string
//! constants; `base.h` is assembled from these sections in a fixed order.

pub const PREAMBLE: &str = "\
// WARNING: Please don't edit this file. It was generated by winrtgen v";

pub const BASE_VERSION_ODR: &str = "\
#ifdef _MSC_VER
#pragma detect_mismatch(\"WINRT_VERSION\", \"{}\")
#endif
";

pub const BASE_INCLUDES: &str = "\
#include <array>
#include <atomic>
#include <charconv>
#include <chrono>
#include <cstddef>
#include <cstring>
#include <iterator>
#include <memory>
#include <string_view>
#include <type_traits>
#include <utility>
";

pub const BASE_MACROS: &str = "\
#ifndef WINRT_IMPL_FAST_FAIL
#define WINRT_IMPL_FAST_FAIL __fastfail(7)
#endif
#ifndef WINRT_ASSERT
#define WINRT_ASSERT(expression) ((void)0)
#endif
#ifndef WINRT_IMPL_SHIM
#define WINRT_IMPL_SHIM(T) (*(abi_t<T>**)&static_cast<T const&>(static_cast<D const&>(*this)))
#endif
";

pub const BASE_TYPES: &str = "\
WINRT_EXPORT namespace winrt
{
    struct hstring;
    struct guid;
    struct hresult;
}

namespace winrt::impl
{
    using ptp_io = struct tp_io*;
    template <typename T> struct abi { using type = T; };
    template <typename T> using abi_t = typename abi<T>::type;
    template <typename T> struct category {};
    template <typename T> struct name {};
    struct unknown_abi;
    struct inspectable_abi;
    struct interface_category;
    struct class_category;
    struct enum_category;
    struct delegate_category;
    template <typename... Fields> struct struct_category;
}
";

pub const BASE_STRING: &str = "\
WINRT_EXPORT namespace winrt
{
    struct hstring
    {
        using value_type = wchar_t;
        hstring() noexcept = default;
    };
}
";

pub const BASE_ERROR: &str = "\
WINRT_EXPORT namespace winrt
{
    struct hresult_error
    {
        hresult_error() noexcept = default;
        explicit hresult_error(hresult const code) noexcept;
    };
}
";

pub const BASE_EVENTS: &str = "\
WINRT_EXPORT namespace winrt
{
    struct event_token
    {
        int64_t value{};
        explicit operator bool() const noexcept { return value != 0; }
    };
}
";

pub const BASE_ACTIVATION: &str = "\
namespace winrt::impl
{
    template <typename Class, typename Interface>
    auto get_activation_factory();
}
";

pub const BASE_FOUNDATION: &str = "\
WINRT_EXPORT namespace winrt::Windows::Foundation
{
    enum class TrustLevel : int32_t { BaseTrust, PartialTrust, FullTrust };
    struct IUnknown;
    struct IInspectable;
    struct Point;
    struct Size;
    struct Rect;
    struct DateTime;
    struct TimeSpan;
    struct EventRegistrationToken;
    struct HResult;
}
";

pub const BASE_STD_HASH: &str = "\
namespace winrt::impl
{
    struct hash_base
    {
        template <typename T> std::size_t operator()(T const& value) const noexcept;
    };
}
";

pub const BASE_VERSION: &str = "\
WINRT_EXPORT namespace winrt
{
    constexpr bool check_version(char const* generated, char const* runtime) noexcept
    {
        return std::string_view(generated) == runtime;
    }
}
";
