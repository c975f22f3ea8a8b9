use std::collections::{BTreeSet, HashMap};
use types::{Classroom, ClassroomId, Instance, Subject, SubjectKind, Teacher, TeacherId};

/// Indexed, read-only view of an [`Instance`].
///
/// Duplicate teachers or classrooms keep their first occurrence; `validate`
/// reports them before a catalog is built in the normal flow.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    teachers: HashMap<TeacherId, Teacher>,
    classrooms: Vec<Classroom>,
    classroom_index: HashMap<ClassroomId, usize>,
    subjects: Vec<Subject>,
    classes: BTreeSet<String>,
}

impl Catalog {
    pub fn new(inst: &Instance) -> Self {
        let mut teachers = HashMap::new();
        for t in &inst.teachers {
            teachers.entry(t.name.clone()).or_insert_with(|| t.clone());
        }

        let mut classrooms = Vec::with_capacity(inst.classrooms.len());
        let mut classroom_index = HashMap::new();
        for r in &inst.classrooms {
            if classroom_index.contains_key(&r.number) {
                continue;
            }
            classroom_index.insert(r.number.clone(), classrooms.len());
            classrooms.push(r.clone());
        }

        let classes = inst
            .classes
            .iter()
            .chain(inst.subjects.iter().flat_map(|s| s.classes.iter()))
            .cloned()
            .collect();

        Self {
            teachers,
            classrooms,
            classroom_index,
            subjects: inst.subjects.clone(),
            classes,
        }
    }

    pub fn teacher(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.get(id)
    }

    pub fn teachers(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers.values()
    }

    pub fn classroom(&self, id: &ClassroomId) -> Option<&Classroom> {
        self.classroom_index.get(id).map(|&i| &self.classrooms[i])
    }

    /// Classrooms in input order.
    pub fn classrooms(&self) -> &[Classroom] {
        &self.classrooms
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn mandatory_subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects
            .iter()
            .filter(|s| s.kind == SubjectKind::Mandatory)
    }

    /// Every class named by the instance or by a subject, sorted.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}
