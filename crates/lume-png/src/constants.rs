/// The 8 byte png signature as a big endian integer
pub const PNG_SIGNATURE: u64 = 0x8950_4E47_0D0A_1A0A;

/// Row start offsets of the seven Adam7 passes
pub const ADAM7_Y_START: [usize; 7] = [0, 0, 4, 0, 2, 0, 1];
/// Column start offsets of the seven Adam7 passes
pub const ADAM7_X_START: [usize; 7] = [0, 4, 0, 2, 0, 1, 0];
/// Row strides of the seven Adam7 passes
pub const ADAM7_Y_STEP: [usize; 7] = [8, 8, 8, 4, 4, 2, 2];
/// Column strides of the seven Adam7 passes
pub const ADAM7_X_STEP: [usize; 7] = [8, 8, 4, 4, 2, 2, 1];
