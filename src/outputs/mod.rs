//! Output generation for scraped results.
//!
//! # Submodules
//!
//! - [`excel`]: Appends search results to the `.xlsx` workbook
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_data.xlsx                 # "News Data" worksheet, one row per result
//! ├── Fed_cuts_rates__what_it_means.jpg
//! └── ...                            # one image per result, named from its title
//! ```

pub mod excel;
