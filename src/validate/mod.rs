//! Request and response validation.


#[cfg(feature = "slave")]
use crate::banks::BankSizes;
#[cfg(feature = "slave")]
use crate::frame::{self, MAX_FRAME};
use crate::frame::offset;
use crate::{EngineError, Exception, FunctionKind, crc};


/// Why an incoming request must not be processed.
#[cfg(feature = "slave")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestFault {
    /// Drop the frame without replying; the error is only recorded. Used for
    /// CRC failures, where the frame may not even have been addressed to us.
    Silent(EngineError),

    /// Answer with an exception response carrying this code.
    Exception(Exception),
}


/// Validates a request frame (station id already matched, CRC still
/// attached), in order: CRC, function-code membership, then the
/// address-range and response-size rules of the addressed function.
///
/// Bit banks are range-checked in words: a request passes when the words it
/// projects onto exist, so the spare bits of a trailing partial word are
/// addressable. The single-coil check shares that word granularity.
#[cfg(feature = "slave")]
pub(crate) fn validate_request(req: &[u8], sizes: &BankSizes) -> Result<FunctionKind, RequestFault> {
    crc::validate(req).map_err(|_| RequestFault::Silent(EngineError::BadCrc))?;

    let Some(kind) = FunctionKind::from_code(req[offset::FUNC]) else {
        return Err(RequestFault::Exception(Exception::IllegalFunction));
    };

    let start = frame::word(req, offset::ADD_HI) as usize;
    match kind {
        FunctionKind::ReadCoils => {
            check_bit_range(start, frame::word(req, offset::NB_HI), sizes.coils)?;
        }
        FunctionKind::WriteMultipleCoils => {
            let quantity = frame::word(req, offset::NB_HI);
            check_bit_range(start, quantity, sizes.coils)?;
            check_payload_len(req, (quantity as usize).div_ceil(8))?;
        }
        FunctionKind::ReadDiscreteInputs => {
            check_bit_range(start, frame::word(req, offset::NB_HI), sizes.discrete)?;
        }
        FunctionKind::WriteSingleCoil => {
            if sizes.coils == 0 || (start + 1).div_ceil(16) > sizes.coils {
                return Err(RequestFault::Exception(Exception::IllegalDataAddress));
            }
        }
        FunctionKind::WriteSingleRegister => {
            if start >= sizes.holding {
                return Err(RequestFault::Exception(Exception::IllegalDataAddress));
            }
        }
        FunctionKind::ReadHoldingRegisters => {
            check_word_range(start, frame::word(req, offset::NB_HI), sizes.holding)?;
        }
        FunctionKind::WriteMultipleRegisters => {
            let quantity = frame::word(req, offset::NB_HI);
            check_word_range(start, quantity, sizes.holding)?;
            check_payload_len(req, quantity as usize * 2)?;
        }
        FunctionKind::ReadInputRegisters => {
            check_word_range(start, frame::word(req, offset::NB_HI), sizes.input)?;
        }
    }
    Ok(kind)
}


/// FC 1, 2, 15: the projected words must exist and the read response
/// (`ceil(qty / 8)` data bytes) must fit a frame.
#[cfg(feature = "slave")]
fn check_bit_range(start: usize, quantity: u16, words: usize) -> Result<(), RequestFault> {
    let quantity = quantity as usize;
    if words == 0 || start / 16 + quantity.div_ceil(16) > words {
        return Err(RequestFault::Exception(Exception::IllegalDataAddress));
    }
    if quantity.div_ceil(8) + 5 > MAX_FRAME {
        return Err(RequestFault::Exception(Exception::IllegalDataValue));
    }
    Ok(())
}


/// FC 3, 4, 16: registers `start..start + qty` must exist and the read
/// response (`qty * 2` data bytes) must fit a frame.
#[cfg(feature = "slave")]
fn check_word_range(start: usize, quantity: u16, words: usize) -> Result<(), RequestFault> {
    let quantity = quantity as usize;
    if words == 0 || start + quantity > words {
        return Err(RequestFault::Exception(Exception::IllegalDataAddress));
    }
    if quantity * 2 + 5 > MAX_FRAME {
        return Err(RequestFault::Exception(Exception::IllegalDataValue));
    }
    Ok(())
}


/// FC 15, 16: the declared byte count and the frame length must actually
/// hold the announced quantity, so the handler never reads past the frame.
#[cfg(feature = "slave")]
fn check_payload_len(req: &[u8], data_bytes: usize) -> Result<(), RequestFault> {
    let byte_count = req[offset::BYTE_CNT] as usize;
    // header (7) + data + CRC (2)
    if byte_count < data_bytes || req.len() < 9 + data_bytes {
        return Err(RequestFault::Exception(Exception::IllegalDataValue));
    }
    Ok(())
}


/// Validates a response frame on the master side: CRC, then the exception
/// bit, then function-code membership.
#[cfg(feature = "master")]
pub(crate) fn validate_answer(resp: &[u8]) -> Result<FunctionKind, EngineError> {
    crc::validate(resp)?;

    let func = resp[offset::FUNC];
    if func & 0x80 != 0 {
        let code = resp[2];
        return Err(EngineError::Exception(Exception::from_code(code)));
    }

    FunctionKind::from_code(func)
        .ok_or(EngineError::Exception(Exception::IllegalFunction))
}
