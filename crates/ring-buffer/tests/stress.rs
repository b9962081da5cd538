use ring_buffer::{RingStore, SampleRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const SAMPLES: u64 = 50_000;

/// Every channel is derived from the timestamp so a torn sample is detectable
fn make_sample(ts: u64) -> SampleRecord {
    let base = ts as i32;
    SampleRecord {
        timestamp_ms: ts,
        accel_x: base,
        accel_y: base.wrapping_mul(3),
        accel_z: base.wrapping_mul(5),
        gyro_x: base.wrapping_neg(),
        gyro_y: base.wrapping_mul(7),
        gyro_z: base.wrapping_mul(11),
        temperature: base % 85,
    }
}

fn assert_intact(record: &SampleRecord) {
    assert_eq!(*record, make_sample(record.timestamp_ms), "torn sample");
    assert!(record.timestamp_ms >= 1 && record.timestamp_ms <= SAMPLES);
}

#[test]
fn test_concurrent_produce_and_read() {
    let store = Arc::new(RingStore::new(16).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let store = store.clone();
        let done = done.clone();
        thread::spawn(move || {
            for ts in 1..=SAMPLES {
                store.produce(make_sample(ts));
                if ts % 97 == 0 {
                    thread::yield_now();
                }
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let peekers: Vec<_> = (0..3)
        .map(|_| {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last = 0;
                while !done.load(Ordering::SeqCst) {
                    if let Some(record) = store.peek_active() {
                        assert_intact(&record);
                        // Lock-serialized produce order: latest never goes backwards
                        assert!(record.timestamp_ms >= last);
                        last = record.timestamp_ms;
                    }
                }
            })
        })
        .collect();

    let drainers: Vec<_> = (0..3)
        .map(|_| {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut walks = 0u64;
                while !done.load(Ordering::SeqCst) {
                    let mut token = store.begin_traversal();
                    let mut last = 0;
                    while let Some(record) = store.advance_traversal(&mut token) {
                        assert_intact(&record);
                        assert!(record.timestamp_ms > last, "walk went backwards");
                        last = record.timestamp_ms;
                        if store.is_traversal_complete(&token) {
                            break;
                        }
                    }
                    walks += 1;
                }
                walks
            })
        })
        .collect();

    producer.join().unwrap();
    for handle in peekers {
        handle.join().unwrap();
    }
    for handle in drainers {
        handle.join().unwrap();
    }

    assert_eq!(store.total_produced(), SAMPLES);
    assert_eq!(store.peek_active().unwrap().timestamp_ms, SAMPLES);
    let history: Vec<u64> = store.snapshot().iter().map(|r| r.timestamp_ms).collect();
    assert_eq!(history, ((SAMPLES - 15)..=SAMPLES).collect::<Vec<_>>());
}
