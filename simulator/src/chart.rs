use serde::Serialize;

/// Construction options for the embedded third-party charting widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub autosize: bool,
    pub symbol: String,
    pub interval: String,
    pub timezone: String,
    pub theme: String,
    pub style: String,
    pub locale: String,
    pub toolbar_bg: String,
    pub enable_publishing: bool,
    pub allow_symbol_change: bool,
    pub container_id: String,
    pub hide_side_toolbar: bool,
    pub studies: Vec<String>,
    pub show_popup_button: bool,
    pub popup_width: String,
    pub popup_height: String,
}

/// Maps an exchange pair such as `BTC/BRL` to the widget's symbol notation.
/// Pairs the chart provider does not list fall back to `BINANCE:BTCUSDT`.
pub fn chart_symbol(pair: &str) -> &'static str {
    match pair.replace('/', "").as_str() {
        "BTCBRL" => "BINANCE:BTCBRL",
        "ETHBRL" => "BINANCE:ETHBRL",
        _ => "BINANCE:BTCUSDT",
    }
}

impl ChartConfig {
    pub fn for_pair(pair: &str) -> Self {
        Self {
            autosize: true,
            symbol: chart_symbol(pair).to_string(),
            interval: "180".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            theme: "dark".to_string(),
            style: "1".to_string(),
            locale: "br".to_string(),
            toolbar_bg: "#0d1117".to_string(),
            enable_publishing: false,
            allow_symbol_change: true,
            container_id: "tradingview_chart".to_string(),
            hide_side_toolbar: false,
            studies: vec!["Volume@tv-basicstudies".to_string()],
            show_popup_button: true,
            popup_width: "1000".to_string(),
            popup_height: "650".to_string(),
        }
    }
}
