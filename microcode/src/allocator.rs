use crate::ds::Catalog;

/// Where one program landed in the flattened control store
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) name: String,
    /// Global address of the program's first step.
    pub(crate) base: usize,
    pub(crate) len: usize,
    /// Distance past the end of fetch, counted in non-fetch steps. `None`
    /// for the fetch prologue itself.
    pub(crate) relative_offset: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Allocation {
    pub(crate) placements: Vec<Placement>,
    pub(crate) total_steps: usize,
}

impl Allocation {
    pub(crate) fn address(&self, program: usize, step: usize) -> Option<usize> {
        self.placements
            .get(program)
            .filter(|p| step < p.len)
            .map(|p| p.base + step)
    }

    #[cfg(test)]
    pub(crate) fn placement(&self, name: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.name == name)
    }

    /// Maps a global address back to (program index, step index).
    pub(crate) fn locate(&self, address: usize) -> Option<(usize, usize)> {
        self.placements
            .iter()
            .position(|p| address >= p.base && address < p.base + p.len)
            .map(|index| (index, address - self.placements[index].base))
    }
}

/// Assigns global addresses in declaration order and relative offsets to
/// every non-fetch program.
pub(crate) fn allocate(catalog: &Catalog) -> Allocation {
    let (placements, (total_steps, _)) = catalog.programs().iter().fold(
        (Vec::new(), (0usize, 0usize)),
        |(mut placements, (next_address, next_offset)), program| {
            let len = program.steps.len();
            let (relative_offset, next_offset) = if program.is_fetch() {
                (None, next_offset)
            } else {
                (Some(next_offset), next_offset + len)
            };
            placements.push(Placement {
                name: program.name.clone(),
                base: next_address,
                len,
                relative_offset,
            });
            (placements, (next_address + len, next_offset))
        },
    );
    Allocation {
        placements,
        total_steps,
    }
}
