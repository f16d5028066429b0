//! Integration tests for the provisioning → controller → provider pipeline.
//!
//! Drives [`HarnessService`] through startup, attribute writes and
//! shutdown, checking both the provider call sequence and the emitted
//! events.

use crate::mock_pwm::{MockProvisioning, MockPwm, PwmCall, RecordingSink};

use pwmtest::app::attributes::Attribute;
use pwmtest::app::commands::PwmCommand;
use pwmtest::app::controller::ChannelState;
use pwmtest::app::events::PwmEvent;
use pwmtest::app::ports::ProvisioningError;
use pwmtest::app::service::{HarnessService, KEY_DUTY, KEY_ENABLED, StartupError};
use pwmtest::config::{HarnessConfig, SAFE_STOP_PERIOD};
use pwmtest::error::{ParseError, ProviderError, PwmTestError};

const DEVICE_PERIOD: u64 = 1_000_000;

fn device() -> MockPwm {
    let mut pwm = MockPwm::new();
    pwm.initial_period = DEVICE_PERIOD;
    pwm
}

fn start(enabled: u32, duty: u32) -> (HarnessService<MockPwm>, RecordingSink) {
    let provisioning = MockProvisioning::new()
        .with(KEY_ENABLED, enabled)
        .with(KEY_DUTY, duty);
    let mut sink = RecordingSink::new();
    let service =
        HarnessService::start(device(), &provisioning, &HarnessConfig::default(), &mut sink)
            .unwrap();
    (service, sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_enables_before_applying_duty() {
    let (service, sink) = start(1, 250_000);

    assert_eq!(
        service.controller().provider().log.calls(),
        vec![
            PwmCall::Acquire("pwm_test".to_owned()),
            PwmCall::Enable,
            PwmCall::Configure {
                duty: 250_000,
                period: DEVICE_PERIOD
            },
        ]
    );

    let expected = ChannelState {
        requested: true,
        period: DEVICE_PERIOD,
        duty: 250_000,
        run: true,
        polarity: false,
    };
    assert_eq!(service.state(), expected);
    assert_eq!(sink.events, vec![PwmEvent::Started(expected)]);
}

#[test]
fn startup_with_enabled_zero_leaves_output_stopped() {
    let (service, _sink) = start(0, 100);
    let log = &service.controller().provider().log;
    assert_eq!(log.count(&PwmCall::Enable), 0);
    assert!(!service.state().run);
    assert_eq!(service.state().duty, 100);
}

#[test]
fn startup_never_writes_the_period() {
    let (service, _sink) = start(0, 0);
    assert_eq!(service.state().period, DEVICE_PERIOD);
    assert_eq!(service.read_attribute(Attribute::Period), "1000000\n");
}

#[test]
fn startup_acquisition_failure_is_fatal() {
    let mut pwm = device();
    pwm.fail_acquire = Some(ProviderError::EBUSY);
    let provisioning = MockProvisioning::new().with(KEY_ENABLED, 1).with(KEY_DUTY, 1);
    let mut sink = RecordingSink::new();

    let err = HarnessService::start(pwm, &provisioning, &HarnessConfig::default(), &mut sink)
        .err()
        .unwrap();

    assert_eq!(
        err,
        StartupError::Acquisition(PwmTestError::AcquisitionFailed(ProviderError::EBUSY))
    );
    assert!(sink.events.is_empty());
}

#[test]
fn startup_duty_above_device_period_releases_channel() {
    let pwm = device();
    let log = pwm.log.clone();
    let provisioning = MockProvisioning::new()
        .with(KEY_ENABLED, 1)
        .with(KEY_DUTY, 2_000_000);
    let mut sink = RecordingSink::new();

    let err = HarnessService::start(pwm, &provisioning, &HarnessConfig::default(), &mut sink)
        .err()
        .unwrap();

    assert_eq!(
        err,
        StartupError::Duty(PwmTestError::ConfigurationRejected(ProviderError::EINVAL))
    );
    let calls = log.calls();
    assert_eq!(
        calls[calls.len() - 3..],
        [
            PwmCall::Configure {
                duty: 0,
                period: SAFE_STOP_PERIOD
            },
            PwmCall::Disable,
            PwmCall::Release,
        ]
    );
}

#[test]
fn startup_missing_duty_key_is_fatal_after_enable() {
    let pwm = device();
    let log = pwm.log.clone();
    let provisioning = MockProvisioning::new().with(KEY_ENABLED, 1);

    let err = HarnessService::start(
        pwm,
        &provisioning,
        &HarnessConfig::default(),
        &mut RecordingSink::new(),
    )
    .err()
    .unwrap();

    assert_eq!(
        err,
        StartupError::Provisioning {
            key: KEY_DUTY,
            error: ProvisioningError::NotFound,
        }
    );
    assert_eq!(log.count(&PwmCall::Enable), 1);
    assert_eq!(log.count(&PwmCall::Release), 1);
}

#[test]
fn startup_enable_failure_is_fatal() {
    let mut pwm = device();
    pwm.fail_enable = Some(ProviderError::EINVAL);
    let provisioning = MockProvisioning::new().with(KEY_ENABLED, 1).with(KEY_DUTY, 1);

    let err = HarnessService::start(
        pwm,
        &provisioning,
        &HarnessConfig::default(),
        &mut RecordingSink::new(),
    )
    .err()
    .unwrap();

    assert_eq!(
        err,
        StartupError::Run(PwmTestError::EnableFailed(ProviderError::EINVAL))
    );
}

#[test]
fn startup_without_auto_request_skips_provisioning() {
    let config = HarnessConfig {
        auto_request: false,
        ..HarnessConfig::default()
    };
    let mut sink = RecordingSink::new();
    let service =
        HarnessService::start(device(), &MockProvisioning::new(), &config, &mut sink).unwrap();

    assert_eq!(service.controller().provider().log.len(), 0);
    assert_eq!(sink.events, vec![PwmEvent::Started(ChannelState::default())]);
}

// ── Attribute writes ──────────────────────────────────────────

#[test]
fn write_consumes_whole_input_and_emits_commit() {
    let (mut service, mut sink) = start(0, 0);

    assert_eq!(
        service.write_attribute(Attribute::Period, "2000000\n", &mut sink),
        Ok(8)
    );
    assert_eq!(
        sink.events.last(),
        Some(&PwmEvent::Committed(PwmCommand::SetPeriod(2_000_000)))
    );
    assert_eq!(service.read_attribute(Attribute::Period), "2000000\n");
}

#[test]
fn rejected_write_emits_rejection_and_keeps_state() {
    let (mut service, mut sink) = start(0, 500);

    let err = service
        .write_attribute(Attribute::Duty, "0x1000000", &mut sink)
        .unwrap_err();

    assert_eq!(err, PwmTestError::ConfigurationRejected(ProviderError::EINVAL));
    assert_eq!(
        sink.events.last(),
        Some(&PwmEvent::Rejected {
            command: PwmCommand::SetDuty(0x100_0000),
            error: err,
        })
    );
    assert_eq!(service.read_attribute(Attribute::Duty), "500\n");
}

#[test]
fn unparsable_write_never_reaches_provider() {
    let (mut service, mut sink) = start(0, 0);
    let before = service.controller().provider().log.len();
    let events_before = sink.events.len();

    assert_eq!(
        service.write_attribute(Attribute::Duty, "12abc", &mut sink),
        Err(PwmTestError::Parse(ParseError::InvalidDigit))
    );
    let overflow = service
        .write_attribute(Attribute::Period, "99999999999999999999999", &mut sink)
        .unwrap_err();
    assert_eq!(overflow.errno(), ProviderError::ERANGE);

    assert_eq!(service.controller().provider().log.len(), before);
    assert_eq!(sink.events.len(), events_before);
}

#[test]
fn flag_attributes_treat_any_non_zero_as_true() {
    let (mut service, mut sink) = start(0, 0);

    service.write_attribute(Attribute::Run, "7", &mut sink).unwrap();
    assert_eq!(service.read_attribute(Attribute::Run), "Enabled\n");

    service.write_attribute(Attribute::Run, "0", &mut sink).unwrap();
    service
        .write_attribute(Attribute::Polarity, "0x1", &mut sink)
        .unwrap();
    assert_eq!(
        service.read_attribute(Attribute::Polarity),
        "Polarity Inversed\n"
    );
}

#[test]
fn request_attribute_releases_and_re_requests() {
    let (mut service, mut sink) = start(1, 10);

    service
        .write_attribute(Attribute::Request, "0", &mut sink)
        .unwrap();
    assert_eq!(service.read_attribute(Attribute::Request), "Freed\n");
    assert_eq!(service.state(), ChannelState::default());
    assert_eq!(
        service.write_attribute(Attribute::Duty, "1", &mut sink),
        Err(PwmTestError::NotRequested)
    );

    service
        .write_attribute(Attribute::Request, "1", &mut sink)
        .unwrap();
    assert_eq!(service.read_attribute(Attribute::Request), "Requested\n");
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_emits_event_and_releases_once() {
    let (service, mut sink) = start(1, 10);
    let log = service.controller().provider().log.clone();

    service.shutdown(&mut sink);

    assert_eq!(sink.events.last(), Some(&PwmEvent::ShutDown));
    assert_eq!(log.count(&PwmCall::Release), 1);
    assert_eq!(
        log.count(&PwmCall::Configure {
            duty: 0,
            period: SAFE_STOP_PERIOD
        }),
        1
    );
}
