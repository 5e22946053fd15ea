//! Port names shared by the harness and the device models

/// Clock input, present on every device
pub const CLK: &str = "clk";

/// Active-low synchronous reset, present on every device
pub const RST_N: &str = "rst_n";

/// Market-data ingest / order-matching pipeline
pub mod pipeline {
    pub const MARKET_DATA_VALID: &str = "market_data_valid";
    /// entity code in bits 63..32, fixed-point price in bits 31..0
    pub const MARKET_DATA_IN: &str = "market_data_in";
    pub const MARKET_DATA_TYPE: &str = "market_data_type";

    pub const EXECUTION_VALID: &str = "order_execution_valid";
    pub const EXECUTION_SYMBOL: &str = "execution_symbol";
    pub const EXECUTION_PRICE: &str = "execution_price";
    pub const EXECUTION_VOLUME: &str = "execution_volume";
}

/// Inventory-aware quote pricing unit
pub mod pricing {
    pub const CALCULATE_EN: &str = "calculate_en";
    /// IEEE-754 bit pattern
    pub const MID_PRICE: &str = "mid_price";
    /// two's complement, 32 bits
    pub const INVENTORY: &str = "inventory";
    /// IEEE-754 bit pattern
    pub const VOLATILITY: &str = "volatility";

    pub const CALCULATION_DONE: &str = "calculation_done";
    pub const OPTIMAL_BID: &str = "optimal_bid";
    pub const OPTIMAL_ASK: &str = "optimal_ask";
    pub const LATENCY_CYCLES: &str = "latency_cycles";
}
