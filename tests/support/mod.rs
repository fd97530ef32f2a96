#![allow(dead_code)]

pub mod tsv;
