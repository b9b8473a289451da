pub mod her2k;
