use super::*;
use crate::testutil::{RecordingOriginator, telegram};
use crate::validate::validate_answer;


fn frame_with_crc(body: &[u8]) -> FrameBuf {
    let mut buf = FrameBuf::new();
    buf.extend_from_slice(body).unwrap();
    frame::append_crc(&mut buf).unwrap();
    buf
}


#[test]
fn test_build_read_request() {
    let t = telegram(0x11, FunctionKind::ReadHoldingRegisters, 0x0000, 3, RecordingOriginator::leaked());
    let mut buf = FrameBuf::new();
    build_request(&mut buf, &t).unwrap();
    assert_eq!(&buf[..], &[0x11, 0x03, 0x00, 0x00, 0x00, 0x03]);
}


#[test]
fn test_build_write_single_coil() {
    let mut t = telegram(0x11, FunctionKind::WriteSingleCoil, 0x0001, 1, RecordingOriginator::leaked());
    t.payload.push(1).unwrap();

    let mut buf = FrameBuf::new();
    build_request(&mut buf, &t).unwrap();
    assert_eq!(&buf[..], &[0x11, 0x05, 0x00, 0x01, 0xFF, 0x00]);

    t.payload[0] = 0;
    build_request(&mut buf, &t).unwrap();
    assert_eq!(&buf[..], &[0x11, 0x05, 0x00, 0x01, 0x00, 0x00]);
}


#[test]
fn test_build_write_multiple_registers() {
    let mut t = telegram(0x01, FunctionKind::WriteMultipleRegisters, 0x0001, 2, RecordingOriginator::leaked());
    t.payload.extend_from_slice(&[0x1234, 0x5678]).unwrap();

    let mut buf = FrameBuf::new();
    build_request(&mut buf, &t).unwrap();
    assert_eq!(
        &buf[..],
        &[0x01, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x12, 0x34, 0x56, 0x78]
    );

    // the full wire image matches the known reference packet
    frame::append_crc(&mut buf).unwrap();
    assert_eq!(&buf[11..], &[0x49, 0x57]);
}


#[test]
fn test_build_write_multiple_coils_packs_bits() {
    let mut t = telegram(0x11, FunctionKind::WriteMultipleCoils, 0x0004, 10, RecordingOriginator::leaked());
    // bank-packed payload: bits 0..=9 hold 1011 0011 01 pattern 0x1CD
    t.payload.push(0x01CD).unwrap();

    let mut buf = FrameBuf::new();
    build_request(&mut buf, &t).unwrap();
    assert_eq!(&buf[..], &[0x11, 0x0F, 0x00, 0x04, 0x00, 0x0A, 0x02, 0xCD, 0x01]);
}


#[test]
fn test_parse_registers_reply() {
    let t = telegram(0x11, FunctionKind::ReadHoldingRegisters, 0x0000, 1, RecordingOriginator::leaked());
    let resp = frame_with_crc(&[0x11, 0x03, 0x02, 0x00, 0x2A]);

    validate_answer(&resp).unwrap();
    let reply = parse_answer(&resp, &t).unwrap();
    let Reply::Registers(words) = reply else { panic!("expected registers") };
    assert_eq!(&words[..], &[0x002A]);
}


#[test]
fn test_parse_bits_reply() {
    let t = telegram(0x11, FunctionKind::ReadCoils, 0x0000, 10, RecordingOriginator::leaked());
    let resp = frame_with_crc(&[0x11, 0x01, 0x02, 0xCD, 0x01]);

    let reply = parse_answer(&resp, &t).unwrap();
    let Reply::Bits { words, count } = reply else { panic!("expected bits") };
    assert_eq!(count, 10);
    assert_eq!(&words[..], &[0x01CD]);
}


#[test]
fn test_parse_write_echo() {
    let t = telegram(0x11, FunctionKind::WriteSingleRegister, 0x0001, 1, RecordingOriginator::leaked());
    let resp = frame_with_crc(&[0x11, 0x06, 0x00, 0x01, 0xAB, 0xCD]);
    assert_eq!(parse_answer(&resp, &t), Ok(Reply::Done));
}


#[test]
fn test_parse_byte_count_mismatch() {
    let t = telegram(0x11, FunctionKind::ReadHoldingRegisters, 0x0000, 2, RecordingOriginator::leaked());
    // announces 2 registers but carries one
    let resp = frame_with_crc(&[0x11, 0x03, 0x02, 0x00, 0x2A]);
    assert_eq!(parse_answer(&resp, &t), Err(EngineError::BadSize));
}


#[test]
fn test_validate_answer_exception() {
    let resp = frame_with_crc(&[0x11, 0x87, 0x01]);
    assert_eq!(
        validate_answer(&resp),
        Err(EngineError::Exception(Exception::IllegalFunction))
    );
}


#[test]
fn test_validate_answer_crc() {
    let resp = [0x11, 0x03, 0x02, 0x00, 0x2A, 0x00, 0x00];
    assert_eq!(validate_answer(&resp), Err(EngineError::BadCrc));
}
