/// Asserts that two floats differ by less than `prec`. Panics with both values otherwise.
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {{
        let (left, right, prec): (f64, f64, f64) = ($a, $b, $prec);
        if !$crate::numeric::almost_eq(left, right, prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                prec, left, right
            );
        }
    }};
}
