//! MPEG frame header lookup tables

// Bitrates in kbps, indexed by [version][layer - 1][bitrate index].
// Index 0 ("free") and index 15 (forbidden) are both 0.
#[rustfmt::skip]
pub(super) const BITRATES: [[[u32; 16]; 3]; 2] = [
	// Version 1
	[
		[0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
		[0, 32, 48, 56,  64,  80,  96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
		[0, 32, 40, 48,  56,  64,  80,  96, 112, 128, 160, 192, 224, 256, 320, 0],
	],
	// Versions 2 and 2.5
	[
		[0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
		[0,  8, 16, 24, 32, 40, 48,  56,  64,  80,  96, 112, 128, 144, 160, 0],
		[0,  8, 16, 24, 32, 40, 48,  56,  64,  80,  96, 112, 128, 144, 160, 0],
	],
];

// Sample rates in Hz, indexed by [version][sample rate index]
pub(super) const SAMPLE_RATES: [[u32; 3]; 3] = [
	[44100, 48000, 32000], // Version 1
	[22050, 24000, 16000], // Version 2
	[11025, 12000, 8000],  // Version 2.5
];

// Padding slot size in bytes, indexed by [layer - 1]
pub(super) const PADDING_SIZES: [u8; 3] = [4, 1, 1];

// Samples per frame, indexed by [layer - 1][version index]
pub(super) const SAMPLES: [[u16; 2]; 3] = [
	[384, 384],   // Layer 1
	[1152, 1152], // Layer 2
	[1152, 576],  // Layer 3
];

// Side information size in bytes, indexed by [version index][channel mode].
// The Xing/Info header sits right behind the side information.
pub(super) const SIDE_INFORMATION_SIZES: [[u32; 4]; 2] = [
	[32, 32, 32, 17], // Version 1
	[17, 17, 17, 9],  // Versions 2 and 2.5
];

// Frame rates by the sequence header's 4 bit index. Index 0 is forbidden.
#[rustfmt::skip]
pub(super) const VIDEO_FRAME_RATES: [f32; 9] = [
	0.0, 23.976, 24.0, 25.0, 29.97, 30.0, 50.0, 59.94, 60.0,
];
