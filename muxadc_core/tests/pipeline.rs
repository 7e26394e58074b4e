//! End-to-end behaviour of the completion handler and drain step, driven from the
//! test thread through `on_complete`.

use muxadc_core::mocks::injected;
use muxadc_core::{
    Channel, Conversion, DrainStatus, MultiChannelAdc, OUT_OF_RANGE, UNFILLED, WindowSize,
};
use muxadc_traits::clock::ManualClock;
use rstest::rstest;

fn adc(window: WindowSize) -> MultiChannelAdc {
    let (converter, _injector) = injected();
    let mut adc = MultiChannelAdc::builder()
        .with_converter(converter)
        .with_window(window)
        .with_noise_floor(20)
        .with_clock(ManualClock::new())
        .build()
        .unwrap();
    adc.begin().unwrap();
    adc
}

/// Feed one full scan cycle (channels 0..=7) with the given readings.
fn cycle(adc: &mut MultiChannelAdc, raws: [u16; 8]) {
    for (channel, raw) in Channel::ALL.into_iter().zip(raws) {
        adc.on_complete(Conversion { channel, raw }).unwrap();
    }
}

/// Feed `seq[i]` to `target` and `fill` to every other channel, one cycle per element.
fn feed_channel(adc: &mut MultiChannelAdc, target: usize, seq: &[u16], fill: u16) {
    for &raw in seq {
        let mut raws = [fill; 8];
        raws[target] = raw;
        cycle(adc, raws);
    }
}

#[rstest]
#[case::impulse_with_noise_floor(0, [18, 19, 100, 21, 20], 20)]
#[case::impulse_all_sub_floor(0, [18, 19, 100, 19, 18], 0)]
#[case::spike_rejected(3, [30, 25, 1000, 28, 27], 28)]
fn one_drain_publishes_median(#[case] channel: usize, #[case] seq: [u16; 5], #[case] want: u16) {
    let mut adc = adc(WindowSize::Five);
    feed_channel(&mut adc, channel, &seq, 500);

    assert_eq!(adc.drain(), DrainStatus::Published);
    assert_eq!(adc.get_channel_value(channel), want);
    // untouched channels carry their constant level
    let other = (channel + 1) % 8;
    assert_eq!(adc.get_channel_value(other), 500);
}

#[test]
fn values_stay_unfilled_until_first_drain() {
    let mut adc = adc(WindowSize::Five);
    for _ in 0..4 {
        cycle(&mut adc, [300; 8]);
        assert_eq!(
            adc.drain(),
            DrainStatus::Pending {
                cycles: adc.state().cycles(),
                needed: 5
            }
        );
    }
    assert_eq!(adc.snapshot(), [UNFILLED; 8]);
    assert_eq!(adc.try_value(Channel::FIRST), None);

    cycle(&mut adc, [300; 8]);
    assert!(adc.drain_due());
    assert!(adc.drain().is_published());
    assert_eq!(adc.snapshot(), [300; 8]);
    assert_eq!(adc.try_value(Channel::FIRST), Some(300));
}

#[test]
fn drain_resets_cycle_counter_and_keeps_values() {
    let mut adc = adc(WindowSize::Five);
    for _ in 0..5 {
        cycle(&mut adc, [100; 8]);
    }
    assert!(adc.drain().is_published());
    assert_eq!(adc.state().cycles(), 0);

    // two more cycles: not enough for another publication, old values remain
    cycle(&mut adc, [900; 8]);
    cycle(&mut adc, [900; 8]);
    assert!(!adc.drain().is_published());
    assert_eq!(adc.snapshot(), [100; 8]);

    for _ in 0..3 {
        cycle(&mut adc, [900; 8]);
    }
    assert!(adc.drain().is_published());
    // ring now holds [900; 5]
    assert_eq!(adc.snapshot(), [900; 8]);
    assert_eq!(adc.output_store().publications(), 2);
}

#[rstest]
#[case(8usize)]
#[case(100usize)]
fn out_of_range_index_returns_default(#[case] index: usize) {
    let mut adc = adc(WindowSize::Five);
    for _ in 0..5 {
        cycle(&mut adc, [700; 8]);
    }
    adc.drain();
    assert_eq!(adc.get_channel_value(index), OUT_OF_RANGE);
}

#[test]
fn negative_index_returns_default() {
    let adc = adc(WindowSize::Five);
    assert_eq!(adc.get_channel_value(-1i32), OUT_OF_RANGE);
    assert_eq!(adc.get_channel_value(i64::MIN), OUT_OF_RANGE);
}

#[test]
fn larger_window_needs_more_cycles() {
    let mut adc = adc(WindowSize::Nine);
    feed_channel(&mut adc, 5, &[40, 41, 900, 42, 43, 44, 0, 45, 46], 60);
    assert!(adc.drain().is_published());
    // sorted: [0,40,41,42,43,44,45,46,900]
    assert_eq!(adc.get_channel_value(5), 43);
}

#[test]
fn first_channel_completions_drive_the_counter() {
    let mut adc = adc(WindowSize::Five);
    // channels 0..=3 only: channel 0 counted once
    for (i, channel) in Channel::ALL.into_iter().take(4).enumerate() {
        adc.on_complete(Conversion {
            channel,
            raw: i as u16,
        })
        .unwrap();
    }
    assert_eq!(adc.state().cycles(), 1);
    assert_eq!(adc.state().ring_len(Channel::ALL[3]), 1);
    assert_eq!(adc.state().ring_len(Channel::ALL[4]), 0);
}
