use muxadc_core::error::BuildError;
use muxadc_core::mocks::NoopConverter;
use muxadc_core::{MultiChannelAdc, Timeouts};
use rstest::rstest;

#[rstest]
fn builder_missing_converter_yields_typed_build_error() {
    let err = MultiChannelAdc::builder()
        .with_noise_floor(20)
        .build()
        .expect_err("should fail with MissingConverter");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingConverter) => {}
        other => panic!("expected MissingConverter, got: {other:?}"),
    }
}

#[rstest]
#[case(0)]
#[case(4)]
#[case(6)]
#[case(13)]
fn builder_rejects_unsupported_window(#[case] n: usize) {
    let err = MultiChannelAdc::builder()
        .with_converter(NoopConverter)
        .with_window_len(n)
        .build()
        .expect_err("window should be rejected");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn builder_rejects_zero_conversion_timeout() {
    let err = MultiChannelAdc::builder()
        .with_converter(NoopConverter)
        .with_timeouts(Timeouts { conversion_ms: 0 })
        .build()
        .expect_err("zero timeout should be rejected");
    assert!(err.to_string().contains("conversion timeout"));
}

#[rstest]
fn builder_defaults_match_reference_configuration() {
    let adc = MultiChannelAdc::builder()
        .with_converter(NoopConverter)
        .build()
        .unwrap();
    assert_eq!(adc.state().window().get(), 5);
    assert_eq!(adc.state().noise_floor(), 20);
    assert_eq!(adc.timeouts().conversion_ms, 50);
    assert!(!adc.is_threaded());
}
