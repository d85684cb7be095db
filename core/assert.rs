/// refaction_assert! is a direct replacement for the assert! builtin used for
/// engine invariants (phase discipline, buffer sizing), kept as its own macro
/// so a simulator hook can be layered underneath without touching call sites.
#[macro_export]
macro_rules! refaction_assert {
    ($cond:expr, $msg:literal, $($optional:tt)+) => {
        assert!($cond, $msg, $($optional)+);
    };
    ($cond:expr, $msg:literal) => {
        assert!($cond, $msg);
    };
}
