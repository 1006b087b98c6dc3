use ethnum::U256;

use crate::babyjubjub::{Point, SUBGROUP_ORDER};
use crate::Element;

const WINDOW_BITS: usize = 4;
const SEGMENT_BITS: usize = 200;

/// The longest input (in bytes) that [`pedersen`] has generators for
pub const MAX_PEDERSEN_BYTES: usize = GENERATORS.len() * SEGMENT_BITS / 8;

/// One generator per 200-bit segment of the input
///
/// Each is `8 · P` where `P` is the first Baby Jubjub point decoded from
/// `blake256("PedersenGenerator_<index>_<attempt>")`, with both numbers zero-padded to 32 digits.
/// These are the same bases the withdrawal circuit hardcodes.
const GENERATORS: [(Element, Element); 10] = [
    (
        Element(U256::from_words(
            0x171e_826a_d4a8_70fd_925e_0bf0_e878_84e7,
            0x0e08_0879_c220_5ef1_0114_f28a_3b6f_6dd7,
        )),
        Element(U256::from_words(
            0x2bd4_07d8_97fb_bca9_f88a_dfd2_d152_52e6,
            0x9de8_c156_4eb4_d3d2_7162_e259_172f_1a1d,
        )),
    ),
    (
        Element(U256::from_words(
            0x05e8_290b_faba_1ccf_ad33_259a_9288_4cc0,
            0x0644_d5fb_019c_a4dc_bdb5_0123_ab32_aaf1,
        )),
        Element(U256::from_words(
            0x05e3_5226_9c07_449e_a666_7d76_08c6_4889,
            0x4125_d94e_751b_1b46_a9cf_56bb_b02f_3766,
        )),
    ),
    (
        Element(U256::from_words(
            0x0cd3_df30_4ebd_d14a_8993_5c39_a56f_a9f3,
            0x93d5_90b7_0d69_80d9_70f4_e39c_edf5_d66f,
        )),
        Element(U256::from_words(
            0x0d38_cda2_472c_d7ee_eec2_a6e3_6d0f_584d,
            0x3f89_f04a_683d_d35f_6c2a_82e8_1340_1278,
        )),
    ),
    (
        Element(U256::from_words(
            0x0fb6_9c17_620f_8833_6886_cabf_bbaf_1657,
            0x8d85_16a8_c300_6233_35fa_1a05_8f51_01c2,
        )),
        Element(U256::from_words(
            0x0651_7f39_6e49_21ed_cd9f_4f4e_87db_196e,
            0x71b7_fe5f_4e6b_d294_87d2_3be4_fee2_9736,
        )),
    ),
    (
        Element(U256::from_words(
            0x2cce_0d71_bc48_8998_8daf_7826_ff1a_41f7,
            0xf52a_61ea_ddf7_7bc4_b3df_9c42_d399_8e2c,
        )),
        Element(U256::from_words(
            0x0290_cc48_cb35_c231_d494_6fc9_45a5_2f48,
            0x78ec_2c64_ff02_def9_af5d_03d1_df60_9a22,
        )),
    ),
    (
        Element(U256::from_words(
            0x034a_2d96_3f82_506b_8fe3_24ed_45c0_7bc6,
            0x215e_9c8c_04f1_f1b2_b72f_fb6e_5eb9_2dfa,
        )),
        Element(U256::from_words(
            0x1efd_7c79_b712_a427_c52f_6a0e_0cb6_a00f,
            0xe534_5500_9896_25db_854e_60c0_0d58_eb63,
        )),
    ),
    (
        Element(U256::from_words(
            0x2051_dc06_aca6_9cde_3af0_0ae6_06cf_7dcb,
            0x75e9_a2a6_ba52_84b3_bd86_b137_0a6d_6c2f,
        )),
        Element(U256::from_words(
            0x1cfe_f6f2_6b5b_aa1b_1b4e_048b_9f45_574b,
            0x5b3e_b255_5860_8984_1128_90d7_4c9e_0d9c,
        )),
    ),
    (
        Element(U256::from_words(
            0x0f10_c769_1ccc_2886_363f_e827_d771_f784,
            0x3eec_9331_64a0_5c6c_17a5_2737_f719_cee3,
        )),
        Element(U256::from_words(
            0x1e33_7532_706c_1826_da45_dbc5_dc46_965b,
            0x6bd1_e7d5_6309_6e8c_6a69_9139_2daf_433f,
        )),
    ),
    (
        Element(U256::from_words(
            0x07e5_7678_e432_9f1d_57e0_6f24_5c7c_19e2,
            0xbf8e_4a96_f73e_cdfd_158a_2268_f50d_7063,
        )),
        Element(U256::from_words(
            0x1a7d_3453_ee31_cdc6_8da4_05f2_eaa3_d0ba,
            0x22fa_ee3d_a7fd_4046_6517_cbf1_039c_b2aa,
        )),
    ),
    (
        Element(U256::from_words(
            0x291d_d77c_3123_b98a_22b1_c8d2_9798_80b3,
            0xd098_4228_2800_b931_430c_8f75_3513_6e15,
        )),
        Element(U256::from_words(
            0x0eee_3eb6_e120_8499_c307_0c01_0a03_0ac5,
            0xc5b6_fd50_ef75_e486_2f9a_f538_4428_9789,
        )),
    ),
];

pub(crate) fn generator(index: usize) -> Point {
    let (x, y) = GENERATORS[index];
    Point::from_coordinates(x, y)
}

/// The Pedersen hash point of `bytes`, read as a little-endian bit string
///
/// The bits are split into 200-bit segments, each segment into 4-bit windows. A window
/// `b0 b1 b2 b3` encodes `(1 + b0 + 2·b1 + 4·b2) · (b3 ? -1 : 1)`, and window `j` of a segment
/// is weighted by `2^(5j)`. The hash is the sum of every segment scalar times its generator.
///
/// Input past [`MAX_PEDERSEN_BYTES`] has no generator and is ignored, so callers must bound it.
pub(crate) fn pedersen(bytes: &[u8]) -> Point {
    let bits = bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| (byte >> i) & 1 == 1))
        .collect::<Vec<_>>();

    bits.chunks(SEGMENT_BITS)
        .zip(0..GENERATORS.len())
        .fold(Point::identity(), |acc, (segment, index)| {
            acc + generator(index).mul_scalar(segment_scalar(segment))
        })
}

/// The signed window sum of one segment, reduced into `0..SUBGROUP_ORDER`
fn segment_scalar(segment: &[bool]) -> U256 {
    let (positive, negative) = segment.chunks(WINDOW_BITS).zip(0u32..).fold(
        (U256::ZERO, U256::ZERO),
        |(positive, negative), (window, j)| {
            let magnitude = window
                .iter()
                .take(WINDOW_BITS - 1)
                .zip(0u32..)
                .fold(1u32, |acc, (&bit, shift)| acc + (u32::from(bit) << shift));
            let value = U256::from(magnitude) << (5 * j);

            match window.get(WINDOW_BITS - 1) {
                Some(true) => (positive, negative + value),
                _ => (positive + value, negative),
            }
        },
    );

    match positive >= negative {
        true => positive - negative,
        false => SUBGROUP_ORDER - (negative - positive),
    }
}
