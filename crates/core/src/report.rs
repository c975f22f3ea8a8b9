use crate::difficulty::Difficulty;
use crate::schedule::Schedule;
use crate::scoring::evaluate;
use types::{DayLoad, DayOfWeek, EntityGaps, MetricWeights, QualityReport};

const WORST_TEACHERS: usize = 3;

pub fn quality_report(
    schedule: &Schedule,
    weights: &MetricWeights,
    difficulty: &dyn Difficulty,
) -> QualityReport {
    let metric = evaluate(schedule, weights, difficulty);
    let exam_practice_lessons = schedule
        .lessons()
        .iter()
        .filter(|l| l.exam_practice)
        .count() as u32;
    let total_lessons = schedule.len() as u32;

    let mut worst_teachers: Vec<EntityGaps> = schedule
        .teachers()
        .map(|t| EntityGaps {
            name: t.0.clone(),
            gaps: schedule.teacher_gaps(t),
        })
        .collect();
    worst_teachers.sort_by(|a, b| b.gaps.cmp(&a.gaps).then_with(|| a.name.cmp(&b.name)));
    worst_teachers.truncate(WORST_TEACHERS);

    QualityReport {
        total_lessons,
        exam_practice_lessons,
        mandatory_lessons: total_lessons - exam_practice_lessons,
        teacher_gaps: metric.teacher_gaps,
        class_gaps: metric.class_gaps,
        daily_load: DayOfWeek::ALL
            .iter()
            .map(|&day| DayLoad {
                day,
                lessons: schedule.day_load(day),
            })
            .collect(),
        load_stddev: metric.load_stddev,
        bad_timing: metric.bad_timing,
        metric: metric.value,
        worst_teachers,
        placement_rate: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::HardSubjects;
    use types::{Lesson, TimeSlot};

    fn at(day: DayOfWeek, n: u8) -> TimeSlot {
        TimeSlot::new(day, n).unwrap()
    }

    #[test]
    fn report_summarises_schedule() {
        let mk = |subject: &str, teacher: &str, class: &str, slot, exam| Lesson {
            subject: subject.into(),
            teacher: teacher.into(),
            class_or_group: class.into(),
            classroom: None,
            slot,
            exam_practice: exam,
        };
        let s = Schedule::from_base(
            [
                mk("Практикум ЕГЭ", "Орлова", "ЕГЭ-1", at(DayOfWeek::Tue, 1), true),
                mk("Математика", "Орлова", "11А", at(DayOfWeek::Tue, 4), false),
                mk("История", "Белов", "10А", at(DayOfWeek::Mon, 1), false),
                mk("История", "Белов", "10А", at(DayOfWeek::Mon, 5), false),
                mk("Химия", "Ершова", "9А", at(DayOfWeek::Fri, 7), false),
                mk("Химия", "Ершова", "9А", at(DayOfWeek::Fri, 6), false),
            ],
            [at(DayOfWeek::Tue, 1)],
        )
        .unwrap();

        let r = quality_report(&s, &MetricWeights::default(), &HardSubjects::default());
        assert_eq!(r.total_lessons, 6);
        assert_eq!(r.exam_practice_lessons, 1);
        assert_eq!(r.mandatory_lessons, 5);
        assert_eq!(r.teacher_gaps, 5);
        assert_eq!(r.class_gaps, 3);
        assert_eq!(r.bad_timing, 2);
        assert_eq!(r.daily_load[1], DayLoad { day: DayOfWeek::Tue, lessons: 2 });
        let names: Vec<_> = r.worst_teachers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Белов", "Орлова", "Ершова"]);
        assert_eq!(r.worst_teachers[0].gaps, 3);
    }
}
