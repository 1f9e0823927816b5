mod constant_time;
mod debug_masking;
mod zeroize_on_drop;
