// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Small domain values for tests that need distinct, non-`Copy` element types.

use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

impl Person {
    #[must_use]
    pub fn new(name: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.age)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Animal {
    pub species: String,
    pub legs: u32,
}

impl Animal {
    #[must_use]
    pub fn new(species: &str, legs: u32) -> Self {
        Self {
            species: species.to_string(),
            legs,
        }
    }
}

pub fn person_alice() -> Person {
    Person::new("Alice", 25)
}

pub fn person_bob() -> Person {
    Person::new("Bob", 30)
}

pub fn person_charlie() -> Person {
    Person::new("Charlie", 35)
}

pub fn animal_dog() -> Animal {
    Animal::new("Dog", 4)
}

pub fn animal_bird() -> Animal {
    Animal::new("Bird", 2)
}
