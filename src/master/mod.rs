//! Master-side request building and response parsing.

#[cfg(test)]
mod test;

use crate::banks::{read_bit, write_bit};
use crate::frame::{FrameBuf, Overrun, offset};
use crate::telegram::{MAX_READ_WORDS, Reply, Telegram};
use crate::{EngineError, Exception, FunctionKind, frame};


/// Builds the request frame for `telegram` into `buf` (CRC appended by the
/// send path).
pub(crate) fn build_request(buf: &mut FrameBuf, telegram: &Telegram) -> Result<(), Overrun> {
    buf.clear();
    frame::push(buf, telegram.target)?;
    frame::push(buf, telegram.function.as_code())?;
    frame::push_word(buf, telegram.start_address)?;

    match telegram.function {
        FunctionKind::ReadCoils
        | FunctionKind::ReadDiscreteInputs
        | FunctionKind::ReadHoldingRegisters
        | FunctionKind::ReadInputRegisters => {
            frame::push_word(buf, telegram.quantity)?;
        }
        FunctionKind::WriteSingleCoil => {
            let set = telegram.payload.first().is_some_and(|value| *value != 0);
            frame::push_word(buf, if set { 0xFF00 } else { 0x0000 })?;
        }
        FunctionKind::WriteSingleRegister => {
            frame::push_word(buf, telegram.payload.first().copied().unwrap_or(0))?;
        }
        FunctionKind::WriteMultipleCoils => {
            let quantity = telegram.quantity as usize;
            let byte_count = quantity.div_ceil(8);
            if byte_count > 247 {
                return Err(Overrun);
            }
            frame::push_word(buf, telegram.quantity)?;
            frame::push(buf, byte_count as u8)?;
            for index in 0..byte_count {
                let mut byte = 0u8;
                for bit in 0..8 {
                    if read_bit(&telegram.payload, index * 8 + bit) {
                        byte |= 1 << bit;
                    }
                }
                frame::push(buf, byte)?;
            }
        }
        FunctionKind::WriteMultipleRegisters => {
            let quantity = telegram.quantity as usize;
            frame::push_word(buf, telegram.quantity)?;
            frame::push(buf, (quantity * 2) as u8)?;
            for index in 0..quantity {
                frame::push_word(buf, telegram.payload.get(index).copied().unwrap_or(0))?;
            }
        }
    }
    Ok(())
}


/// Decodes a validated response into the telegram's reply.
///
/// Read payloads are cross-checked against the announced byte count before
/// anything is copied; write responses carry no payload.
pub(crate) fn parse_answer(resp: &[u8], telegram: &Telegram) -> Result<Reply, EngineError> {
    if resp[offset::FUNC] != telegram.function.as_code() {
        return Err(EngineError::Exception(Exception::IllegalFunction));
    }

    match telegram.function {
        FunctionKind::ReadCoils | FunctionKind::ReadDiscreteInputs => {
            let quantity = telegram.quantity as usize;
            let byte_count = resp[2] as usize;
            if byte_count != quantity.div_ceil(8) || resp.len() < 5 + byte_count {
                return Err(EngineError::BadSize);
            }
            let mut words: heapless::Vec<u16, MAX_READ_WORDS> = heapless::Vec::new();
            words
                .resize(quantity.div_ceil(16), 0)
                .map_err(|_| EngineError::BadSize)?;
            for bit in 0..quantity {
                let set = (resp[3 + bit / 8] >> (bit % 8)) & 1 == 1;
                write_bit(&mut words, bit, set);
            }
            Ok(Reply::Bits { words, count: telegram.quantity })
        }
        FunctionKind::ReadHoldingRegisters | FunctionKind::ReadInputRegisters => {
            let quantity = telegram.quantity as usize;
            let byte_count = resp[2] as usize;
            if byte_count != quantity * 2 || resp.len() < 5 + byte_count {
                return Err(EngineError::BadSize);
            }
            let mut words: heapless::Vec<u16, MAX_READ_WORDS> = heapless::Vec::new();
            for index in 0..quantity {
                words
                    .push(frame::word(resp, 3 + index * 2))
                    .map_err(|_| EngineError::BadSize)?;
            }
            Ok(Reply::Registers(words))
        }
        FunctionKind::WriteSingleCoil
        | FunctionKind::WriteSingleRegister
        | FunctionKind::WriteMultipleCoils
        | FunctionKind::WriteMultipleRegisters => Ok(Reply::Done),
    }
}
