#![no_main]
use libfuzzer_sys::fuzz_target;
use muxadc_core::MedianFilter;

fuzz_target!(|input: (u8, Vec<u16>)| {
    let (w, stream) = input;
    let window = [5usize, 7, 9, 11][usize::from(w % 4)];
    let mut f = MedianFilter::new(window);
    for (i, &v) in stream.iter().enumerate() {
        f.add(v);
        let lo = (i + 1).saturating_sub(window);
        let mut sorted = stream[lo..=i].to_vec();
        sorted.sort_unstable();
        assert_eq!(f.median(), Some(sorted[sorted.len() / 2]));
    }
});
