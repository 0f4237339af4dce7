//! Slave-side function handlers.
//!
//! Each handler applies a validated request to the addressed bank and
//! rewrites the frame buffer in place into the response body (CRC is
//! appended by the send path).


use crate::banks::{Banks, read_bit, write_bit};
use crate::frame::{FrameBuf, Overrun, offset};
use crate::{FunctionKind, frame};


/// Dispatches a validated request and builds the response in `buf`.
pub(crate) fn process_request(
    buf: &mut FrameBuf,
    kind: FunctionKind,
    banks: &mut Banks,
) -> Result<(), Overrun> {
    match kind {
        FunctionKind::ReadCoils => {
            read_bits(buf, banks.coils.as_deref().unwrap_or(&[]))
        }
        FunctionKind::ReadDiscreteInputs => {
            read_bits(buf, banks.discrete.as_deref().unwrap_or(&[]))
        }
        FunctionKind::ReadHoldingRegisters => {
            read_words(buf, banks.holding.as_deref().unwrap_or(&[]))
        }
        FunctionKind::ReadInputRegisters => {
            read_words(buf, banks.input.as_deref().unwrap_or(&[]))
        }
        FunctionKind::WriteSingleCoil => {
            write_single_coil(buf, banks.coils.as_deref_mut().unwrap_or(&mut []))
        }
        FunctionKind::WriteSingleRegister => {
            write_single_register(buf, banks.holding.as_deref_mut().unwrap_or(&mut []))
        }
        FunctionKind::WriteMultipleCoils => {
            write_multiple_coils(buf, banks.coils.as_deref_mut().unwrap_or(&mut []))
        }
        FunctionKind::WriteMultipleRegisters => {
            write_multiple_registers(buf, banks.holding.as_deref_mut().unwrap_or(&mut []))
        }
    }
}


/// FC 1 / FC 2: byte count, then the requested bits packed LSB-first.
fn read_bits(buf: &mut FrameBuf, bank: &[u16]) -> Result<(), Overrun> {
    let start = frame::word(buf, offset::ADD_HI) as usize;
    let quantity = frame::word(buf, offset::NB_HI) as usize;

    buf.truncate(2);
    frame::push(buf, quantity.div_ceil(8) as u8)?;
    let mut byte = 0u8;
    for bit in 0..quantity {
        if read_bit(bank, start + bit) {
            byte |= 1 << (bit % 8);
        }
        if bit % 8 == 7 {
            frame::push(buf, byte)?;
            byte = 0;
        }
    }
    if quantity % 8 != 0 {
        frame::push(buf, byte)?;
    }
    Ok(())
}


/// FC 3 / FC 4: byte count, then the requested registers as big-endian
/// words.
fn read_words(buf: &mut FrameBuf, bank: &[u16]) -> Result<(), Overrun> {
    let start = frame::word(buf, offset::ADD_HI) as usize;
    let quantity = frame::word(buf, offset::NB_HI) as usize;

    buf.truncate(2);
    frame::push(buf, (quantity * 2) as u8)?;
    for value in &bank[start..start + quantity] {
        frame::push_word(buf, *value)?;
    }
    Ok(())
}


/// FC 5: `FF 00` sets the coil, anything else clears it. The response is
/// the 6-byte echo of the request.
fn write_single_coil(buf: &mut FrameBuf, bank: &mut [u16]) -> Result<(), Overrun> {
    let address = frame::word(buf, offset::ADD_HI) as usize;
    let set = buf[offset::NB_HI] == 0xFF;

    write_bit(bank, address, set);
    buf.truncate(6);
    Ok(())
}


/// FC 6: stores the value and echoes the request.
fn write_single_register(buf: &mut FrameBuf, bank: &mut [u16]) -> Result<(), Overrun> {
    let address = frame::word(buf, offset::ADD_HI) as usize;
    let value = frame::word(buf, offset::NB_HI);

    bank[address] = value;
    buf.truncate(6);
    Ok(())
}


/// FC 15: unpacks LSB-first request bytes into the coil bank and echoes
/// start + quantity.
fn write_multiple_coils(buf: &mut FrameBuf, bank: &mut [u16]) -> Result<(), Overrun> {
    let start = frame::word(buf, offset::ADD_HI) as usize;
    let quantity = frame::word(buf, offset::NB_HI) as usize;

    for bit in 0..quantity {
        let byte = buf[offset::BYTE_CNT + 1 + bit / 8];
        write_bit(bank, start + bit, (byte >> (bit % 8)) & 1 == 1);
    }
    buf.truncate(6);
    Ok(())
}


/// FC 16: stores big-endian words from the request and echoes
/// start + quantity.
fn write_multiple_registers(buf: &mut FrameBuf, bank: &mut [u16]) -> Result<(), Overrun> {
    let start = frame::word(buf, offset::ADD_HI) as usize;
    let quantity = frame::word(buf, offset::NB_HI) as usize;

    for index in 0..quantity {
        bank[start + index] = frame::word(buf, offset::BYTE_CNT + 1 + index * 2);
    }
    buf.truncate(6);
    Ok(())
}
