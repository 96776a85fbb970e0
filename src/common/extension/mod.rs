pub mod trng;
