mod idioms;
mod structogram;
