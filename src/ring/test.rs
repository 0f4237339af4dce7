use super::*;


#[test]
fn test_push_then_drain_in_order() {
    let mut ring = RingBuffer::new();
    for byte in [0x11, 0x03, 0x00, 0x2A] {
        ring.push(byte);
    }
    assert_eq!(ring.count(), 4);

    let mut out = [0u8; 8];
    let n = ring.drain(&mut out);
    assert_eq!(n, 4);
    assert_eq!(&out[..4], &[0x11, 0x03, 0x00, 0x2A]);
    assert_eq!(ring.count(), 0);
}


#[test]
fn test_count_tracks_pushes_minus_drains() {
    let mut ring = RingBuffer::new();
    for i in 0..10 {
        ring.push(i);
    }
    let mut out = [0u8; 4];
    ring.drain(&mut out);
    assert_eq!(ring.count(), 6);
    ring.push(0xFF);
    assert_eq!(ring.count(), 7);
}


#[test]
fn test_overflow_keeps_newest_bytes() {
    let mut ring = RingBuffer::new();
    for i in 0..MAX_BUFFER {
        ring.push(i as u8);
    }
    assert!(!ring.is_overflowed());

    // one past capacity: byte 0 is dropped
    ring.push(0xAB);
    assert!(ring.is_overflowed());
    assert_eq!(ring.count(), MAX_BUFFER);

    let mut out = [0u8; MAX_BUFFER];
    let n = ring.drain(&mut out);
    assert_eq!(n, MAX_BUFFER);
    assert_eq!(out[0], 1);
    assert_eq!(out[MAX_BUFFER - 1], 0xAB);
}


#[test]
fn test_overflow_sticky_until_full_drain() {
    let mut ring = RingBuffer::new();
    for i in 0..=MAX_BUFFER {
        ring.push(i as u8);
    }
    assert!(ring.is_overflowed());

    // partial drain leaves the flag set
    let mut out = [0u8; 16];
    ring.drain(&mut out);
    assert!(ring.is_overflowed());

    // draining the rest clears it
    let mut rest = [0u8; MAX_BUFFER];
    while ring.drain(&mut rest) > 0 {}
    assert!(!ring.is_overflowed());
    assert_eq!(ring.count(), 0);
}


#[test]
fn test_clear_resets_everything() {
    let mut ring = RingBuffer::new();
    for i in 0..=MAX_BUFFER {
        ring.push(i as u8);
    }
    ring.clear();
    assert_eq!(ring.count(), 0);
    assert!(!ring.is_overflowed());
}
