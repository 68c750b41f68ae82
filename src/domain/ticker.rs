//! Symbol translation between the dashboard's display form (`BTC/USD`) and
//! the backend's wire form (`BTC-USD`).

/// Composite wire symbols shorter than this are left alone by `to_display_form`.
const MIN_COMPOSITE_WIRE_LEN: usize = 7;

/// `BTC/USD` -> `BTC-USD`. Only the first `/` is replaced; symbols without one pass through.
pub fn to_wire_form(display: &str) -> String {
    if display.contains('/') {
        display.replacen('/', "-", 1)
    } else {
        display.to_string()
    }
}

/// `BTC-USD` -> `BTC/USD`.
///
/// Only symbols that contain a `-` *and* are longer than six characters are
/// treated as composite pairs. Short hyphenated symbols (`BRK-B`) are kept
/// verbatim, which also means a short composite such as `A/B` does not
/// survive a round trip through the wire form.
pub fn to_display_form(wire: &str) -> String {
    if wire.contains('-') && wire.chars().count() >= MIN_COMPOSITE_WIRE_LEN {
        wire.replacen('-', "/", 1)
    } else {
        wire.to_string()
    }
}

/// True when `display` comes back unchanged from a wire round trip.
pub fn is_round_trippable(display: &str) -> bool {
    to_display_form(&to_wire_form(display)) == display
}
