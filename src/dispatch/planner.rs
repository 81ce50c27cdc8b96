use super::{CallOrder, Propagate};
use crate::topic::{descendants, Topic};

/// Список топиков, из которых `publish` берёт обработчики для одного имени.
///
/// Для [`CallOrder::FromCurrent`]: сам топик (если `CURRENT`), затем предки
/// от ближайшего (если `TO_TOP`), затем зарегистрированные потомки по
/// возрастанию (если `TO_DEEP`). `FromBegin` и `FromEnd` сортируют весь
/// список, включая сам топик, по возрастанию или убыванию.
///
/// При `hierarchy == false` предки не добавляются.
pub fn plan<'a, I>(
    topic: &Topic,
    scope: Propagate,
    order: CallOrder,
    registered: I,
    hierarchy: bool,
) -> Vec<Topic>
where
    I: IntoIterator<Item = &'a Topic>,
{
    let mut planned = Vec::new();

    if scope.contains(Propagate::CURRENT) {
        planned.push(topic.clone());
    }

    if scope.contains(Propagate::TO_TOP) && hierarchy {
        planned.extend(topic.ancestors());
    }

    if scope.contains(Propagate::TO_DEEP) {
        let mut deep = descendants(topic, registered);
        deep.sort();
        planned.extend(deep);
    }

    match order {
        CallOrder::FromCurrent => {}
        CallOrder::FromBegin => planned.sort(),
        CallOrder::FromEnd => planned.sort_by(|a, b| b.cmp(a)),
    }
    planned
}
