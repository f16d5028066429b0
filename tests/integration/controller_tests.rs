//! Controller scenarios against the recording mock provider.
//!
//! Covers the request lifecycle, period/duty coupling, rollback on
//! provider rejection, and the safe-stop sequence on shutdown and drop.

use crate::mock_pwm::{ConfigureOutcome, ConfigureSpy, MockPwm, PwmCall};

use pwmtest::app::controller::{ChannelState, Field, FieldValue, PwmTestController};
use pwmtest::adapters::ledc::LedcPwmProvider;
use pwmtest::config::{HarnessConfig, SAFE_STOP_PERIOD};
use pwmtest::error::{ProviderError, PwmTestError};

fn requested() -> PwmTestController<MockPwm> {
    let mut c = PwmTestController::new(MockPwm::new(), &HarnessConfig::default());
    c.request(true).unwrap();
    c
}

// ── Request lifecycle ─────────────────────────────────────────

#[test]
fn request_passes_device_name_as_owner() {
    let c = requested();
    assert_eq!(
        c.provider().log.calls(),
        vec![PwmCall::Acquire("pwm_test".to_owned())]
    );
}

#[test]
fn request_does_not_configure_the_channel() {
    let c = requested();
    assert_eq!(c.state().period, 0);
    assert_eq!(c.state().duty, 0);
    assert!(!c.is_running());
    assert_eq!(c.provider().log.len(), 1);
}

#[test]
fn release_while_running_frees_and_clears_everything() {
    let mut c = requested();
    c.set_period(1000).unwrap();
    c.set_duty(300).unwrap();
    c.set_run(true).unwrap();

    c.request(false).unwrap();

    assert_eq!(c.state(), ChannelState::default());
    assert_eq!(c.provider().log.last(), Some(PwmCall::Release));
    assert!(c.handle().is_none());
}

#[test]
fn release_resets_inverted_polarity() {
    let mut c = requested();
    c.set_polarity(true).unwrap();
    assert_eq!(c.query(Field::Polarity), FieldValue::Flag(true));

    c.request(false).unwrap();

    assert_eq!(c.query(Field::Polarity), FieldValue::Flag(false));
    assert_eq!(c.state(), ChannelState::default());

    // A fresh claim starts from normal polarity too.
    c.request(true).unwrap();
    assert_eq!(c.query(Field::Polarity), FieldValue::Flag(false));
}

#[test]
fn release_when_unrequested_is_a_no_op() {
    let mut c = PwmTestController::new(MockPwm::new(), &HarnessConfig::default());
    c.request(false).unwrap();
    c.request(false).unwrap();
    assert_eq!(c.provider().log.len(), 0);
}

#[test]
fn failed_acquisition_reports_provider_code() {
    let mut pwm = MockPwm::new();
    pwm.fail_acquire = Some(ProviderError::EBUSY);
    let mut c = PwmTestController::new(pwm, &HarnessConfig::default());

    let err = c.request(true).unwrap_err();
    assert_eq!(err, PwmTestError::AcquisitionFailed(ProviderError::EBUSY));
    assert_eq!(err.errno(), ProviderError::EBUSY);
    assert!(!c.is_requested());
}

#[test]
fn re_request_after_release_acquires_again() {
    let mut c = requested();
    c.request(false).unwrap();
    c.request(true).unwrap();
    assert_eq!(c.provider().log.count(&PwmCall::Acquire("pwm_test".to_owned())), 2);
    assert!(c.is_requested());
}

#[test]
fn configure_run_reject_then_release() {
    let mut c = requested();
    c.set_period(1000).unwrap();
    c.set_duty(500).unwrap();
    c.set_run(true).unwrap();
    assert_eq!(c.query(Field::Duty), FieldValue::Units(500));
    assert_eq!(c.query(Field::Period), FieldValue::Units(1000));
    assert_eq!(c.query(Field::Run), FieldValue::Flag(true));

    assert!(matches!(
        c.set_period(300),
        Err(PwmTestError::ConfigurationRejected(_))
    ));
    assert_eq!(c.query(Field::Period), FieldValue::Units(1000));

    c.request(false).unwrap();
    assert_eq!(c.query(Field::Period), FieldValue::Units(0));
    assert_eq!(c.query(Field::Duty), FieldValue::Units(0));
    assert_eq!(c.query(Field::Run), FieldValue::Flag(false));
    assert_eq!(c.query(Field::Requested), FieldValue::Flag(false));
}

// ── Period / duty coupling ────────────────────────────────────

#[test]
fn period_change_carries_committed_duty() {
    let mut c = requested();
    c.set_period(1000).unwrap();
    c.set_duty(400).unwrap();
    c.set_period(2000).unwrap();

    assert_eq!(
        c.provider().log.last(),
        Some(PwmCall::Configure {
            duty: 400,
            period: 2000
        })
    );
    assert_eq!(c.query(Field::Period), FieldValue::Units(2000));
    assert_eq!(c.query(Field::Duty), FieldValue::Units(400));
}

#[test]
fn shrinking_period_below_duty_rolls_back() {
    let mut c = requested();
    c.set_period(1000).unwrap();
    c.set_duty(800).unwrap();

    assert_eq!(
        c.set_period(500),
        Err(PwmTestError::ConfigurationRejected(ProviderError::EINVAL))
    );
    assert_eq!(c.period(), 1000);
    assert_eq!(c.duty(), 800);
}

#[test]
fn duty_equal_to_period_is_accepted() {
    let mut c = requested();
    c.set_period(1000).unwrap();
    c.set_duty(1000).unwrap();
    assert_eq!(c.duty(), 1000);
}

#[test]
fn duty_before_period_is_rejected_against_zero_period() {
    let mut c = requested();
    assert_eq!(
        c.set_duty(1),
        Err(PwmTestError::ConfigurationRejected(ProviderError::EINVAL))
    );
    assert_eq!(c.duty(), 0);
}

#[test]
fn out_of_range_period_keeps_previous_value() {
    let mut pwm = MockPwm::new();
    pwm.max_period = Some(10_000);
    let mut c = PwmTestController::new(pwm, &HarnessConfig::default());
    c.request(true).unwrap();
    c.set_period(5_000).unwrap();

    assert_eq!(
        c.set_period(20_000),
        Err(PwmTestError::ConfigurationRejected(ProviderError::ERANGE))
    );
    assert_eq!(c.period(), 5_000);
    assert_eq!(c.handle().unwrap().period, 5_000);
}

// ── Run / polarity ────────────────────────────────────────────

#[test]
fn enable_failure_leaves_output_stopped() {
    let mut pwm = MockPwm::new();
    pwm.fail_enable = Some(ProviderError::EINVAL);
    let mut c = PwmTestController::new(pwm, &HarnessConfig::default());
    c.request(true).unwrap();

    assert_eq!(
        c.set_run(true),
        Err(PwmTestError::EnableFailed(ProviderError::EINVAL))
    );
    assert!(!c.is_running());
}

#[test]
fn disable_is_always_committed() {
    let mut c = requested();
    c.set_run(true).unwrap();
    c.set_run(false).unwrap();
    assert_eq!(c.query(Field::Run), FieldValue::Flag(false));
    assert_eq!(c.provider().log.last(), Some(PwmCall::Disable));
}

#[test]
fn polarity_can_change_while_stopped() {
    let mut c = requested();
    c.set_polarity(true).unwrap();
    assert!(c.is_inverted());
    assert!(c.handle().unwrap().inverted);

    c.set_polarity(false).unwrap();
    assert_eq!(c.query(Field::Polarity), FieldValue::Flag(false));
}

#[test]
fn polarity_refused_while_running_is_not_committed() {
    let mut c = requested();
    c.set_run(true).unwrap();
    assert_eq!(
        c.set_polarity(true),
        Err(PwmTestError::PolarityRejected(ProviderError::EBUSY))
    );
    assert!(!c.is_inverted());
    assert!(c.is_running());
}

// ── NotRequested ──────────────────────────────────────────────

#[test]
fn configuration_without_request_never_reaches_provider() {
    let mut c = PwmTestController::new(MockPwm::new(), &HarnessConfig::default());
    assert_eq!(c.set_period(1000), Err(PwmTestError::NotRequested));
    assert_eq!(c.set_duty(10), Err(PwmTestError::NotRequested));
    assert_eq!(c.set_run(true), Err(PwmTestError::NotRequested));
    assert_eq!(c.set_polarity(true), Err(PwmTestError::NotRequested));
    assert_eq!(c.provider().log.len(), 0);
    assert_eq!(PwmTestError::NotRequested.errno(), ProviderError::ENODEV);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_parks_disables_then_releases() {
    let mut c = requested();
    c.set_period(20_000).unwrap();
    c.set_duty(5_000).unwrap();
    c.set_run(true).unwrap();
    let before = c.provider().log.len();

    c.shutdown();

    let calls = c.provider().log.calls();
    assert_eq!(
        &calls[before..],
        &[
            PwmCall::Configure {
                duty: 0,
                period: SAFE_STOP_PERIOD
            },
            PwmCall::Disable,
            PwmCall::Release,
        ]
    );
    assert_eq!(c.state(), ChannelState::default());
}

#[test]
fn shutdown_on_ledc_parks_at_safe_stop_period() {
    let config = HarnessConfig::default();
    let spy = ConfigureSpy::new(LedcPwmProvider::new(&config));
    let outcomes = spy.outcomes.clone();
    let mut c = PwmTestController::new(spy, &config);
    c.request(true).unwrap();
    c.set_period(500_000).unwrap();
    c.set_duty(250_000).unwrap();
    c.set_run(true).unwrap();

    c.shutdown();

    assert_eq!(
        outcomes.borrow().last(),
        Some(&ConfigureOutcome {
            duty: 0,
            period: config.safe_stop_period,
            result: Ok(()),
            period_after: config.safe_stop_period,
        })
    );
    assert!(!c.provider().inner.is_claimed());
}

#[test]
fn shutdown_uses_configured_safe_stop_period() {
    let config = HarnessConfig {
        safe_stop_period: 50_000,
        ..HarnessConfig::default()
    };
    let mut c = PwmTestController::new(MockPwm::new(), &config);
    c.request(true).unwrap();
    c.shutdown();
    assert!(c.provider().log.calls().contains(&PwmCall::Configure {
        duty: 0,
        period: 50_000
    }));
}

#[test]
fn shutdown_continues_when_safe_stop_is_rejected() {
    let mut pwm = MockPwm::new();
    pwm.max_period = Some(100);
    let mut c = PwmTestController::new(pwm, &HarnessConfig::default());
    c.request(true).unwrap();

    c.shutdown();

    let calls = c.provider().log.calls();
    assert_eq!(calls[calls.len() - 2..], [PwmCall::Disable, PwmCall::Release]);
    assert!(!c.is_requested());
}

#[test]
fn shutdown_when_unrequested_touches_nothing() {
    let mut c = PwmTestController::new(MockPwm::new(), &HarnessConfig::default());
    c.shutdown();
    assert_eq!(c.provider().log.len(), 0);
}

#[test]
fn drop_runs_safe_stop() {
    let c = requested();
    let log = c.provider().log.clone();
    drop(c);

    assert_eq!(log.count(&PwmCall::Release), 1);
    assert_eq!(log.count(&PwmCall::Disable), 1);
}

#[test]
fn drop_after_release_does_not_release_twice() {
    let mut c = requested();
    c.request(false).unwrap();
    let log = c.provider().log.clone();
    drop(c);

    assert_eq!(log.count(&PwmCall::Release), 1);
    assert_eq!(log.count(&PwmCall::Disable), 0);
}
