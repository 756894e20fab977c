// Cached regular expressions

mod cache;
