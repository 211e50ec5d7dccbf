//! Scraping of the Los Angeles Times search results.
//!
//! The work for one search is split into layers, each driving the one below
//! it once per unit:
//!
//! | Layer | Module | Unit |
//! |-------|--------|------|
//! | Site flows | [`latimes`] | open the site, search, apply filters |
//! | Pagination | [`pagination`] | one results page, batched persistence |
//! | Page | [`page`] | one `li > ps-promo` result, date cutoff |
//! | Article | [`article`] | fields, image download, metrics |
//!
//! Every layer receives the [`crate::browser::Navigator`] it works on
//! through its constructor or arguments.

pub mod article;
pub mod latimes;
pub mod page;
pub mod pagination;

#[cfg(test)]
pub(crate) mod testing;
