mod fonts;
mod interpreting;
mod support;
