//! Call-site capture for pushes.

/// Path of the enclosing function, e.g. `my_crate::io::read`.
///
/// Closures report the function they are defined in.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let name = name.strip_suffix("::__here").unwrap_or(name);
        name.trim_end_matches("::{{closure}}")
    }};
}

/// Push a frame in front of the first one, filling in the call site.
///
/// ```
/// use errchain::{push_first, ErrorChain, SystemAllocator};
///
/// let alloc = SystemAllocator::new();
/// let mut chain = ErrorChain::construct(&alloc).unwrap();
///
/// push_first!(chain, 7).unwrap();
/// push_first!(chain, 8, b"detail").unwrap();
///
/// let frame = chain.peek_first().unwrap();
/// assert_eq!(frame.code(), 8);
/// assert_eq!(frame.file(), file!());
/// ```
#[macro_export]
macro_rules! push_first {
    ($chain:expr, $code:expr) => {
        $crate::push_first!($chain, $code, &[])
    };
    ($chain:expr, $code:expr, $opaque:expr) => {
        $chain.push_first(
            $code,
            ::core::file!(),
            u64::from(::core::line!()),
            $crate::function_name!(),
            $opaque,
        )
    };
}

/// Push a frame after the last one, filling in the call site.
///
/// ```
/// use errchain::{push_last, ErrorChain, SystemAllocator};
///
/// fn open(chain: &mut ErrorChain<'_>) {
///     push_last!(chain, -2, &[1, 2]).unwrap();
/// }
///
/// let alloc = SystemAllocator::new();
/// let mut chain = ErrorChain::construct(&alloc).unwrap();
/// open(&mut chain);
///
/// let frame = chain.peek_last().unwrap();
/// assert!(frame.function().ends_with("open"));
/// assert_eq!(frame.opaque(), &[1, 2]);
/// ```
#[macro_export]
macro_rules! push_last {
    ($chain:expr, $code:expr) => {
        $crate::push_last!($chain, $code, &[])
    };
    ($chain:expr, $code:expr, $opaque:expr) => {
        $chain.push_last(
            $code,
            ::core::file!(),
            u64::from(::core::line!()),
            $crate::function_name!(),
            $opaque,
        )
    };
}

#[cfg(test)]
mod tests {
    use errchain_alloc::SystemAllocator;

    use crate::ErrorChain;

    fn helper() -> &'static str {
        function_name!()
    }

    #[test]
    fn function_name_is_enclosing_path() {
        assert!(helper().ends_with("macros::tests::helper"));

        let from_closure = (|| function_name!())();
        assert!(from_closure.ends_with("function_name_is_enclosing_path"));
    }

    #[test]
    fn macros_capture_call_site() {
        let alloc = SystemAllocator::new();
        let mut chain = ErrorChain::construct(&alloc).unwrap();

        let line = line!() + 1;
        push_last!(chain, 3).unwrap();
        push_first!(chain, 4, b"ctx").unwrap();

        let last = chain.peek_last().unwrap();
        assert_eq!(last.code(), 3);
        assert_eq!(last.file(), file!());
        assert_eq!(last.line(), u64::from(line));
        assert!(last.function().ends_with("macros_capture_call_site"));
        assert!(last.opaque().is_empty());

        assert_eq!(chain.peek_first().unwrap().opaque(), b"ctx");
    }
}
