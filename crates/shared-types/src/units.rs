// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Native currency unit formatting

use alloy_primitives::U256;

const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;
const ETHER_DECIMALS: usize = 18;

/// Format a decimal wei amount as an ether string without trailing zeros
///
/// `"1500000000000000000"` becomes `"1.5"`. Empty or unparseable input yields `"0"`.
pub fn format_wei_to_ether(wei: &str) -> String {
    let Ok(amount) = U256::from_str_radix(wei.trim(), 10) else {
        return "0".to_string();
    };

    let divisor = U256::from(WEI_PER_ETHER);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = ETHER_DECIMALS);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
