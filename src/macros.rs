/// Construct a [`Value`][crate::Value] from a JSON-like literal.
///
/// ```
/// let ctx = bristle::value! {
///     title: "My Blog",
///     posts: [
///         { name: "First", published: true },
///         { name: "Second", published: false },
///     ],
/// };
/// ```
#[macro_export]
macro_rules! value {
    (None) => {
        $crate::Value::None
    };

    () => {
        $crate::Value::Map($crate::Map::new())
    };

    ([ $($tt:tt)* ]) => {
        $crate::Value::List($crate::__value_list![[] $($tt)*])
    };

    ({ $($tt:tt)* }) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $crate::__value_map!(map () $($tt)*);
        $crate::Value::Map(map)
    }};

    ($key:ident : $($rest:tt)*) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $crate::__value_map!(map () $key : $($rest)*);
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

// TT muncher for the inside of a list `[...]`; elements accumulate in the
// leading bracket group.
#[doc(hidden)]
#[macro_export]
macro_rules! __value_list {
    ([$($out:expr,)*]) => {
        ::std::vec![$($out),*]
    };

    ([$($out:expr,)*] None $(, $($rest:tt)*)?) => {
        $crate::__value_list![[$($out,)* $crate::Value::None,] $($($rest)*)?]
    };

    ([$($out:expr,)*] [$($list:tt)*] $(, $($rest:tt)*)?) => {
        $crate::__value_list![[$($out,)* $crate::value!([$($list)*]),] $($($rest)*)?]
    };

    ([$($out:expr,)*] {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::__value_list![[$($out,)* $crate::value!({$($map)*}),] $($($rest)*)?]
    };

    ([$($out:expr,)*] $next:expr $(, $($rest:tt)*)?) => {
        $crate::__value_list![[$($out,)* $crate::value!($next),] $($($rest)*)?]
    };
}

// TT muncher for the inside of a map `{...}`; entries insert into the given
// map variable as they are parsed.
#[doc(hidden)]
#[macro_export]
macro_rules! __value_map {
    ($map:ident ()) => {};

    ($map:ident () $key:ident : $($rest:tt)*) => {
        $crate::__value_map!($map ($key) $($rest)*);
    };

    ($map:ident ($key:ident) None $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from(stringify!($key)), $crate::Value::None);
        $crate::__value_map!($map () $($($rest)*)?);
    };

    ($map:ident ($key:ident) [$($list:tt)*] $(, $($rest:tt)*)?) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::value!([$($list)*]),
        );
        $crate::__value_map!($map () $($($rest)*)?);
    };

    ($map:ident ($key:ident) {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::value!({$($inner)*}),
        );
        $crate::__value_map!($map () $($($rest)*)?);
    };

    ($map:ident ($key:ident) $value:expr $(, $($rest:tt)*)?) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::value!($value),
        );
        $crate::__value_map!($map () $($($rest)*)?);
    };
}
