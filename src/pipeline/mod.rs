pub mod extraction; // Report text → typed report
pub mod validation; // Detected patterns → taxonomy checks
