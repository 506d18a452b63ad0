use std::time::SystemTime;

pub struct SystemClock;

impl services::anytrust::port::Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(feature = "test-helpers")]
mod test_helpers {
    use std::{
        sync::{Arc, atomic::AtomicU64},
        time::{Duration, SystemTime, UNIX_EPOCH},
    };

    #[derive(Default, Clone)]
    pub struct TestClock {
        epoch_millis: Arc<AtomicU64>,
    }

    impl TestClock {
        pub fn new(time: SystemTime) -> Self {
            let clock = Self::default();
            clock.set_time(time);
            clock
        }

        pub fn now(&self) -> SystemTime {
            UNIX_EPOCH
                + Duration::from_millis(
                    self.epoch_millis.load(std::sync::atomic::Ordering::Relaxed),
                )
        }

        pub fn advance_time(&self, adv: Duration) {
            self.set_time(self.now() + adv)
        }

        pub fn set_time(&self, new_time: SystemTime) {
            let millis = new_time
                .duration_since(UNIX_EPOCH)
                .map(|since| since.as_millis() as u64)
                .unwrap_or_default();
            self.epoch_millis
                .store(millis, std::sync::atomic::Ordering::Relaxed)
        }
    }

    impl services::anytrust::port::Clock for TestClock {
        fn now(&self) -> SystemTime {
            self.now()
        }
    }
}

#[cfg(feature = "test-helpers")]
pub use test_helpers::TestClock;

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use services::anytrust::port::Clock;

    use crate::TestClock;

    #[test]
    fn can_advance_clock() {
        // given
        let test_clock = TestClock::default();
        let starting_time = test_clock.now();
        let adv = Duration::from_secs(1);

        // when
        test_clock.advance_time(adv);

        // then
        let new_time = Clock::now(&test_clock);
        assert_eq!(new_time - adv, starting_time);
    }

    #[test]
    fn starts_at_the_given_time() {
        let time = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let test_clock = TestClock::new(time);

        assert_eq!(test_clock.now(), time);
    }
}
