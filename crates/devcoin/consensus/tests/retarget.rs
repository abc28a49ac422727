//! Retarget behaviour over synthetic chains

use alloy_primitives::{B256, U256};
use assert_matches::assert_matches;
use devcoin_chainspec::{ChainParams, DEVCOIN_MAINNET, DEVCOIN_REGTEST, DEVCOIN_TESTNET};
use devcoin_consensus::{
    decode_compact, encode_compact, next_required_bits, time::FixedTime, BlockHeader, ChainIndex,
    DevcoinPow, RetargetAlgorithm, RetargetError,
};

const BITS: u32 = 0x1c0f_fff0;
const GENESIS_TIME: u32 = 1_300_000_000;

fn hash(n: u64) -> B256 {
    B256::left_padding_from(&n.to_be_bytes())
}

/// Chain ending at `tip_height` with one block per entry of `blocks`
fn build(tip_height: u64, blocks: &[(u32, u32)]) -> ChainIndex {
    let mut index = ChainIndex::with_start_height(tip_height + 1 - blocks.len() as u64);
    for (i, (bits, time)) in blocks.iter().enumerate() {
        index.push(hash(i as u64), *bits, *time);
    }
    index
}

/// `len` blocks with the same bits, `spacing` seconds apart
fn uniform(tip_height: u64, len: usize, bits: u32, spacing: u32) -> ChainIndex {
    let blocks: Vec<_> = (0..len as u32).map(|i| (bits, GENESIS_TIME + i * spacing)).collect();
    build(tip_height, &blocks)
}

fn scaled(bits: u32, numerator: u64, denominator: u64) -> u32 {
    encode_compact(decode_compact(bits).target * U256::from(numerator) / U256::from(denominator))
}

fn next(index: &ChainIndex, candidate_time: u32, params: &ChainParams) -> Result<u32, RetargetError> {
    next_required_bits(index.tip(), candidate_time, params)
}

#[test]
fn test_switchover_uses_both_algorithms() {
    assert_eq!(RetargetAlgorithm::for_height(149_999), RetargetAlgorithm::Legacy);
    assert_eq!(RetargetAlgorithm::for_height(150_000), RetargetAlgorithm::Current);

    // same ancestry at both heights
    let legacy = uniform(149_999, 200, BITS, 600);
    let current = uniform(150_000, 200, BITS, 600);

    // legacy retargets every block from a trimmed median of 131 spacings
    assert_eq!(next(&legacy, 0, &DEVCOIN_MAINNET), Ok(scaled(BITS, 131 * 600, 86_400)));
    // 150_001 is not a multiple of 144
    assert_eq!(next(&current, 0, &DEVCOIN_MAINNET), Ok(BITS));
}

#[test]
fn test_bootstrap_ignores_history() {
    let blocks = [
        (0x1d00_ffff, GENESIS_TIME),
        (0x1b01_0000, GENESIS_TIME + 5),
        (0x1c7f_0000, GENESIS_TIME + 100_000),
        (0x1d00_8000, GENESIS_TIME + 3),
    ];
    let index = build(3, &blocks);
    for params in [&*DEVCOIN_MAINNET, &*DEVCOIN_TESTNET] {
        assert_eq!(next(&index, u32::MAX, params), Ok(0x1d00_8000));
    }
}

#[test]
fn test_bootstrap_ends_at_height_ten() {
    let limit_bits = encode_compact(DEVCOIN_TESTNET.proof_of_work_limit);

    // a long gap at height 9 still keeps the last bits
    let index = uniform(9, 10, BITS, 600);
    let tip_time = index.tip().unwrap().time;
    assert_eq!(next(&index, tip_time + 1_201, &DEVCOIN_TESTNET), Ok(BITS));

    // from height 10 the minimum-difficulty rule applies
    let index = uniform(10, 11, BITS, 600);
    let tip_time = index.tip().unwrap().time;
    assert_eq!(next(&index, tip_time + 1_201, &DEVCOIN_TESTNET), Ok(limit_bits));
    assert_eq!(next(&index, tip_time + 1_200, &DEVCOIN_TESTNET), Ok(BITS));
}

#[test]
fn test_smoothing_starts_at_10700() {
    // 10_700 is not a multiple of 2016, the last block below smoothing keeps its bits
    let index = uniform(10_699, 144, BITS, 6_000);
    assert_eq!(next(&index, u32::MAX, &DEVCOIN_MAINNET), Ok(BITS));

    // one block later every block retargets over a one-day window
    let index = uniform(10_700, 144, BITS, 600);
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(scaled(BITS, 143 * 600, 86_400)));
}

#[test]
fn test_legacy_between_retargets() {
    // two-week interval of 2016 blocks before the smoothing height
    let index = uniform(5_000, 20, BITS, 6_000);
    assert_eq!(next(&index, u32::MAX, &DEVCOIN_MAINNET), Ok(BITS));
}

#[test]
fn test_legacy_min_difficulty_exception() {
    let index = uniform(5_000, 20, BITS, 600);
    let tip_time = index.tip().unwrap().time;
    let limit_bits = encode_compact(DEVCOIN_TESTNET.proof_of_work_limit);

    assert_eq!(next(&index, tip_time + 1_201, &DEVCOIN_TESTNET), Ok(limit_bits));
    assert_eq!(next(&index, tip_time + 1_200, &DEVCOIN_TESTNET), Ok(BITS));
}

#[test]
fn test_legacy_two_week_retarget() {
    // 4032 is a multiple of 2016
    let index = uniform(4_031, 2_016, BITS, 600);
    let target_timespan = 14 * 86_400;
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(scaled(BITS, 2_015 * 600, target_timespan)));
}

#[test]
fn test_smooth_retarget_before_median_height() {
    // the last block's bits differ from its window
    let mut blocks: Vec<_> = (0..144u32).map(|i| (BITS, GENESIS_TIME + i * 600)).collect();
    blocks[143].0 = 0x1c07_fff8;

    // 10_751 is not a multiple of 144, smoothing retargets anyway
    let index = build(10_750, &blocks);
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(scaled(0x1c07_fff8, 143 * 600, 86_400)));

    // plain timespan and last bits up to and including the median height
    let index = build(10_800, &blocks);
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(scaled(0x1c07_fff8, 143 * 600, 86_400)));
}

#[test]
fn test_median_retarget_uses_average_target() {
    let mut blocks: Vec<_> = (0..144u32).map(|i| (BITS, GENESIS_TIME + i * 600)).collect();
    blocks[143].0 = 0x1c07_fff8;
    let index = build(10_801, &blocks);

    let window = U256::from(143u64);
    let average = (decode_compact(BITS).target * U256::from(142u64) +
        decode_compact(0x1c07_fff8).target) /
        window;
    let expected = encode_compact(average * U256::from(131u64 * 600) / U256::from(86_400u64));
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(expected));
}

#[test]
fn test_median_resists_outlier_timestamps() {
    let mut blocks: Vec<_> = (0..144u32).map(|i| (BITS, GENESIS_TIME + i * 600)).collect();
    let honest = next(&build(20_000, &blocks), 0, &DEVCOIN_MAINNET).unwrap();

    // a few wildly wrong timestamps fall inside the trimmed ends
    blocks[140].1 = GENESIS_TIME + 10_000_000;
    blocks[141].1 = GENESIS_TIME - 10_000_000;
    blocks[142].1 = GENESIS_TIME + 20_000_000;
    let manipulated = next(&build(20_000, &blocks), 0, &DEVCOIN_MAINNET).unwrap();

    let honest = decode_compact(honest).target;
    let manipulated = decode_compact(manipulated).target;
    assert!(manipulated <= honest * U256::from(2u64));
    assert!(honest <= manipulated * U256::from(2u64));
}

#[test]
fn test_zero_drift_at_boundary() {
    // 2016 blocks spanning exactly the two-week regtest timespan.
    // 151_200 is a multiple of 2016.
    let mut blocks: Vec<_> = (0..2_016u32).map(|i| (BITS, GENESIS_TIME + 600 + i * 600)).collect();
    blocks[0].1 = GENESIS_TIME;
    let index = build(151_199, &blocks);
    let span = index.tip().unwrap().block_time() - index.find(&hash(0)).unwrap().block_time();
    assert_eq!(span, DEVCOIN_REGTEST.target_timespan);

    assert_eq!(next(&index, 0, &DEVCOIN_REGTEST), Ok(BITS));
}

#[test]
fn test_uniform_spacing_spans_one_gap_short() {
    // interval - 1 gaps between the first and last block of the window
    let index = uniform(151_199, 2_016, BITS, 600);
    assert_eq!(next(&index, 0, &DEVCOIN_REGTEST), Ok(scaled(BITS, 2_015, 2_016)));

    let index = uniform(160_127, 144, BITS, 600);
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(scaled(BITS, 143, 144)));
}

#[test]
fn test_slow_chain_is_clamped() {
    let quadrupled = encode_compact(decode_compact(BITS).target * U256::from(4u64));

    // double spacing stays inside the bounds
    let index = uniform(151_199, 2_016, BITS, 1_200);
    let doubled = next(&index, 0, &DEVCOIN_REGTEST).unwrap();
    assert_eq!(doubled, scaled(BITS, 2_015 * 1_200, 14 * 86_400));
    assert!(decode_compact(doubled).target < decode_compact(quadrupled).target);

    // anything beyond four times the timespan hits the ceiling
    let index = uniform(151_199, 2_016, BITS, 3_000);
    assert_eq!(next(&index, 0, &DEVCOIN_REGTEST), Ok(quadrupled));
}

#[test]
fn test_fast_chain_is_clamped() {
    let index = uniform(151_199, 2_016, BITS, 1);
    assert_eq!(next(&index, 0, &DEVCOIN_REGTEST), Ok(scaled(BITS, 1, 4)));
}

#[test]
fn test_retarget_never_exceeds_limit() {
    let limit_bits = encode_compact(DEVCOIN_MAINNET.proof_of_work_limit);
    let index = uniform(160_127, 144, limit_bits, 6_000);
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(limit_bits));

    let index = uniform(30_000, 144, limit_bits, 6_000);
    assert_eq!(next(&index, 0, &DEVCOIN_MAINNET), Ok(limit_bits));
}

#[test]
fn test_regtest_limit_does_not_overflow() {
    let limit_bits = encode_compact(DEVCOIN_REGTEST.proof_of_work_limit);
    assert_eq!(limit_bits, 0x207f_ffff);
    let index = uniform(151_199, 2_016, limit_bits, 6_000);
    assert_eq!(next(&index, 0, &DEVCOIN_REGTEST), Ok(limit_bits));
}

#[test]
fn test_short_index_is_reported() {
    let index = uniform(160_127, 50, BITS, 600);
    assert_matches!(
        next(&index, 0, &DEVCOIN_MAINNET),
        Err(RetargetError::MissingAncestors { height: 160_127, .. })
    );

    let index = uniform(12_000, 143, BITS, 600);
    assert_matches!(
        next(&index, 0, &DEVCOIN_MAINNET),
        Err(RetargetError::MissingAncestors { height: 12_000, needed: 143 })
    );
}

#[test]
fn test_min_difficulty_run_on_testnet() {
    let limit_bits = encode_compact(DEVCOIN_TESTNET.proof_of_work_limit);
    let pow = DevcoinPow::from(&*DEVCOIN_TESTNET);
    let mut index = uniform(170_000, 10, BITS, 600);

    // a stalled testnet mines a few blocks at the limit
    for i in 0..4 {
        let tip = index.tip().unwrap();
        let time = tip.time + 3_600;
        let bits = pow.next_required_bits(Some(tip), time).unwrap();
        assert_eq!(bits, limit_bits);
        index.push(hash(1_000 + i), bits, time);
    }

    // then returns to the real difficulty on time
    let tip = index.tip().unwrap();
    assert_eq!(pow.next_required_bits(Some(tip), tip.time + 600), Ok(BITS));
}

#[test]
fn test_update_time_drives_testnet_retarget() {
    let pow = DevcoinPow::from(&*DEVCOIN_TESTNET);
    let index = uniform(170_000, 20, BITS, 600);
    let tip = index.tip().unwrap();
    let mut candidate = BlockHeader::new(1, tip.hash, B256::ZERO, 0, BITS, 0);

    pow.update_time(&mut candidate, tip, &FixedTime(i64::from(tip.time) + 30)).unwrap();
    assert_eq!(candidate.time, tip.time + 30);
    assert_eq!(candidate.bits, BITS);

    pow.update_time(&mut candidate, tip, &FixedTime(i64::from(tip.time) + 7_200)).unwrap();
    assert_eq!(candidate.time, tip.time + 7_200);
    assert_eq!(candidate.bits, encode_compact(DEVCOIN_TESTNET.proof_of_work_limit));

    // a clock far behind the chain cannot move the timestamp below median time past
    pow.update_time(&mut candidate, tip, &FixedTime(0)).unwrap();
    assert_eq!(i64::from(candidate.time), tip.median_time_past() + 1);
}
