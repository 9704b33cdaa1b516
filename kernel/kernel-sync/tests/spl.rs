use kernel_sync::spl::{self, Spl};

// The level is a process-wide (per-"CPU") value, so everything runs in one
// test to avoid cross-thread interference from the parallel test runner.
#[test]
fn raise_restore_and_nesting() {
    assert_eq!(spl::current(), Spl::Low);

    {
        let g = spl::raise_high();
        assert_eq!(g.prior(), Spl::Low);
        assert_eq!(spl::current(), Spl::High);

        // nested raise observes and restores High
        {
            let inner = spl::raise_high();
            assert_eq!(inner.prior(), Spl::High);
            assert_eq!(spl::current(), Spl::High);
        }
        assert_eq!(spl::current(), Spl::High);
    }

    assert_eq!(spl::current(), Spl::Low);
}
