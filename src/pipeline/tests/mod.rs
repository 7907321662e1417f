mod doubles;
mod run;
